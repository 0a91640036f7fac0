//!
//! Facilities for manipulating classes.
//!
//! A class is a permanent, process-lifetime entity: it is allocated once,
//! registered under its unique name, and never destroyed. The handle is
//! therefore a copyable reference with identity equality, and all mutable
//! state lives behind locks inside the class structure.
//!

use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use mort_core::GrowArray;
use parking_lot::RwLock;

use crate::cache::MethodCache;
use crate::error::RuntimeError;
use crate::ivar::Ivar;
use crate::method::{Imp, Method};
use crate::selectors::Sel;

/// The reserved leading slot of every instance (the class reference).
pub const ISA_SLOT_SIZE: usize = std::mem::size_of::<usize>();

/// Which side of a class a method or cache belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSide {
    /// Class-side: messages sent to the class itself.
    Class,
    /// Instance-side: messages sent to instances of the class.
    Instance,
}

/// The structure behind a class handle.
pub struct ClassData {
    name: String,
    superclass: Option<Class>,
    class_methods: RwLock<GrowArray<Arc<Method>>>,
    instance_methods: RwLock<GrowArray<Arc<Method>>>,
    ivars: RwLock<GrowArray<Arc<Ivar>>>,
    instance_size: AtomicUsize,
    in_construction: AtomicBool,
    finishing: AtomicBool,
    class_cache: MethodCache,
    instance_cache: MethodCache,
    extra_space: RwLock<Box<[u8]>>,
}

/// A handle to a registered class.
///
/// Cheap to copy and compare; two handles are equal iff they denote the same
/// registered class.
#[derive(Clone, Copy)]
pub struct Class(&'static ClassData);

impl Class {
    /// Allocate a new class structure, marked in-construction.
    ///
    /// Registration into the class registry is the runtime's job; the two
    /// steps happen atomically under the registry write lock.
    pub(crate) fn allocate(name: &str, superclass: Option<Class>, extra_space: usize) -> Self {
        let data = ClassData {
            name: name.to_string(),
            superclass,
            class_methods: RwLock::new(GrowArray::new()),
            instance_methods: RwLock::new(GrowArray::new()),
            ivars: RwLock::new(GrowArray::new()),
            // An instance always leads with its class slot. Ivars follow.
            instance_size: AtomicUsize::new(ISA_SLOT_SIZE),
            in_construction: AtomicBool::new(true),
            finishing: AtomicBool::new(false),
            class_cache: MethodCache::new(),
            instance_cache: MethodCache::new(),
            extra_space: RwLock::new(vec![0u8; extra_space].into_boxed_slice()),
        };
        // Classes live for the rest of the process.
        Class(Box::leak(Box::new(data)))
    }

    /// Get the class's name.
    pub fn name(self) -> &'static str {
        self.0.name.as_str()
    }

    /// Get the superclass, or `None` for a root class.
    pub fn superclass(self) -> Option<Class> {
        self.0.superclass
    }

    /// Whether the class is still in construction (not yet finished).
    pub fn is_in_construction(self) -> bool {
        self.0.in_construction.load(Ordering::Acquire)
    }

    /// Claim the right to finish this class.
    ///
    /// Only the first caller wins; the class stays in construction until
    /// that caller clears the flag, so no half-initialized class becomes
    /// visible.
    pub(crate) fn begin_finish(self) -> bool {
        self.0
            .finishing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn clear_in_construction(self) {
        self.0.in_construction.store(false, Ordering::Release);
    }

    /// The size of an instance's ivar block in bytes, including the leading
    /// class slot but excluding extension space and extra bytes.
    pub fn instance_size(self) -> usize {
        self.0.instance_size.load(Ordering::Acquire)
    }

    /// Iterate over this class and its superclasses, most derived first.
    pub fn superclass_chain(self) -> impl Iterator<Item = Class> {
        std::iter::successors(Some(self), |class| class.superclass())
    }

    /// Whether this class is `ancestor` or inherits from it.
    pub fn descends_from(self, ancestor: Class) -> bool {
        self.superclass_chain().any(|class| class == ancestor)
    }

    /// Declare an instance variable on this class.
    ///
    /// The offset is the class's current instance size aligned up to
    /// `align`; the instance size grows accordingly. Fails on a duplicate
    /// name within this class (shadowing across the hierarchy is fine) and
    /// on a class that has already been finished.
    pub fn add_ivar(
        self,
        name: &str,
        size: usize,
        align: usize,
        types: &str,
    ) -> Result<Arc<Ivar>, RuntimeError> {
        if !self.is_in_construction() {
            return Err(RuntimeError::ClassAlreadyFinished(self.name().to_string()));
        }
        assert!(
            align != 0 && align.is_power_of_two(),
            "ivar alignment must be a power of two (got {})",
            align
        );

        let mut ivars = self.0.ivars.write();
        if ivars.iter().any(|ivar| ivar.name == name) {
            return Err(RuntimeError::DuplicateIvarName {
                class: self.name().to_string(),
                name: name.to_string(),
            });
        }

        let offset = align_up(self.0.instance_size.load(Ordering::Acquire), align);
        self.0
            .instance_size
            .store(offset + size, Ordering::Release);

        let ivar = Arc::new(Ivar {
            name: name.to_string(),
            types: types.to_string(),
            size,
            align,
            offset,
        });
        ivars.push(ivar.clone());
        Ok(ivar)
    }

    /// Find an ivar declared directly on this class.
    pub fn own_ivar_named(self, name: &str) -> Option<Arc<Ivar>> {
        let ivars = self.0.ivars.read();
        ivars.iter().find(|ivar| ivar.name == name).cloned()
    }

    /// Find an ivar on this class or anywhere up the superclass chain.
    ///
    /// The most derived declaration wins, which is how ivar shadowing works.
    pub fn ivar_named(self, name: &str) -> Option<Arc<Ivar>> {
        self.superclass_chain().find_map(|class| class.own_ivar_named(name))
    }

    /// All ivars declared directly on this class, in declaration order.
    pub fn own_ivars(self) -> Vec<Arc<Ivar>> {
        self.0.ivars.read().iter().cloned().collect()
    }

    fn method_list(self, side: MethodSide) -> &'static RwLock<GrowArray<Arc<Method>>> {
        match side {
            MethodSide::Class => &self.0.class_methods,
            MethodSide::Instance => &self.0.instance_methods,
        }
    }

    pub(crate) fn cache(self, side: MethodSide) -> &'static MethodCache {
        match side {
            MethodSide::Class => &self.0.class_cache,
            MethodSide::Instance => &self.0.instance_cache,
        }
    }

    /// Append methods to one side's list.
    ///
    /// No dedup: a re-added selector sits behind the original in the list
    /// and is never found, while a subclass's addition shadows a superclass
    /// implementation. That is how overriding works.
    pub(crate) fn push_methods(self, side: MethodSide, methods: &[Arc<Method>]) {
        let mut list = self.method_list(side).write();
        for method in methods {
            list.push(method.clone());
        }
    }

    /// Search this class's own list (not inherited, not cached) linearly
    /// for a selector match.
    pub(crate) fn lookup_own_method(self, side: MethodSide, selector: Sel) -> Option<Arc<Method>> {
        let list = self.method_list(side).read();
        list.iter()
            .find(|method| method.selector == selector)
            .cloned()
    }

    /// Swap the implementation of this class's own method for `selector`.
    ///
    /// Returns the replaced method, or `None` if the class itself does not
    /// implement the selector.
    pub(crate) fn replace_own_method(
        self,
        side: MethodSide,
        selector: Sel,
        imp: Imp,
    ) -> Option<Arc<Method>> {
        let mut list = self.method_list(side).write();
        let index = list.index_of(|method| method.selector == selector)?;
        let old = list.get(index).clone();
        *list.get_mut(index) = Method::new(selector, old.types.clone(), imp);
        Some(old)
    }

    /// Run `f` over a sub-slice of this class's extension extra space.
    pub(crate) fn with_extra_space<R>(
        self,
        offset: usize,
        len: usize,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        let mut space = self.0.extra_space.write();
        let end = offset + len;
        if end > space.len() {
            panic!(
                "class extra space out of bounds on '{}' ({} / {})",
                self.name(),
                end,
                space.len()
            );
        }
        f(&mut space[offset..end])
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.0.name)
            .field("superclass", &self.0.superclass.map(Class::name))
            .field("in_construction", &self.is_in_construction())
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Round `value` up to the next multiple of `align` (a power of two).
pub(crate) fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}
