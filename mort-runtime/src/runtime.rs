//!
//! The central runtime state.
//!
//! This holds what the dispatch engine works against: the selector table,
//! the class registry and the frozen extension set. Creating classes and
//! adding methods happens here because those operations need registry-wide
//! knowledge (name uniqueness, subclass scans for cache invalidation).
//!

use std::sync::Arc;

use mort_core::HashTable;
use parking_lot::RwLock;

use crate::class::{Class, MethodSide};
use crate::error::RuntimeError;
use crate::extension::{ClassExtension, ExtensionId, ExtensionSet};
use crate::instance::Instance;
use crate::method::{Imp, Method};
use crate::selectors::{Sel, SelectorTable};

/// The well-known forwarding selector.
pub const FORWARD_SELECTOR: &str = "forwardMessage:";

fn class_name(class: &Class) -> &str {
    class.name()
}

fn same_class_name(a: &Class, b: &Class) -> bool {
    a.name() == b.name()
}

/// The runtime: selector table, class registry and extension set.
///
/// All operations are synchronous and thread-safe; blocking only ever
/// happens on the internal reader-writer locks, never on I/O.
pub struct Runtime {
    selectors: RwLock<SelectorTable>,
    classes: RwLock<HashTable<Class, str>>,
    extensions: RwLock<ExtensionSet>,
    forward_selector: Sel,
}

impl Runtime {
    /// Create a fresh runtime with no classes and no extensions.
    pub fn new() -> Self {
        let mut selectors = SelectorTable::new();
        let forward_selector = selectors.intern(FORWARD_SELECTOR);
        Self {
            selectors: RwLock::new(selectors),
            classes: RwLock::new(HashTable::with_capacity(16, class_name, same_class_name)),
            extensions: RwLock::new(ExtensionSet::new()),
            forward_selector,
        }
    }

    /* ---- Selectors ---- */

    /// Register (intern) a selector name, returning its canonical handle.
    ///
    /// Lookup happens under the read lock; on a miss the write lock is
    /// taken and the lookup re-checked, so concurrent first registrations
    /// never produce two handles.
    pub fn register_selector(&self, name: &str) -> Sel {
        if let Some(selector) = self.selectors.read().lookup(name) {
            return selector;
        }
        self.selectors.write().intern(name)
    }

    /// Get the name behind a selector handle.
    pub fn selector_name(&self, selector: Sel) -> &'static str {
        self.selectors.read().name(selector)
    }

    /// The interned forwarding selector.
    pub fn forward_selector(&self) -> Sel {
        self.forward_selector
    }

    /* ---- Extensions ---- */

    /// Register a class extension.
    ///
    /// Must happen before the first class is created; afterwards the set is
    /// frozen and registration fails with `ExtensionsFrozen`.
    pub fn register_extension(
        &self,
        extension: ClassExtension,
    ) -> Result<ExtensionId, RuntimeError> {
        self.extensions.write().register(extension)
    }

    /// Run `f` over `class`'s extra-space slice owned by extension `id`.
    pub fn with_class_space<R>(
        &self,
        id: ExtensionId,
        class: Class,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        let extensions = self.extensions.read();
        let entry = extensions.get(id);
        class.with_extra_space(
            entry.class_offset,
            entry.extension.extra_class_space,
            f,
        )
    }

    /// Run `f` over `instance`'s extra-space slice owned by extension `id`.
    pub fn with_object_space<R>(
        &self,
        id: ExtensionId,
        instance: &Instance,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        let extensions = self.extensions.read();
        let entry = extensions.get(id);
        let offset = instance.class().instance_size() + entry.object_offset;
        instance.with_region(offset, entry.extension.extra_object_space, f)
    }

    /* ---- Class lifecycle ---- */

    /// Create a new class, registering it immediately.
    ///
    /// The existence check and the insert are one atomic step under the
    /// registry write lock, so two threads racing on the same name cannot
    /// both succeed. Creating the first class freezes the extension set.
    ///
    /// The returned class is in construction: add ivars and methods, then
    /// call `finish_class` before instantiating it.
    pub fn create_class(
        &self,
        superclass: Option<Class>,
        name: &str,
    ) -> Result<Class, RuntimeError> {
        if name.is_empty() {
            panic!("cannot create a class with an empty name");
        }

        let mut classes = self.classes.write();
        if classes.get(name).is_some() {
            return Err(RuntimeError::DuplicateClassName(name.to_string()));
        }

        let class_space = {
            let mut extensions = self.extensions.write();
            extensions.freeze();
            extensions.class_space()
        };

        let class = Class::allocate(name, superclass, class_space);
        classes.insert(class);
        Ok(class)
    }

    /// Finish a class: run every extension's class initializer over its
    /// extra-space slice, then clear the in-construction flag.
    ///
    /// Must be called before any instance of the class is created.
    pub fn finish_class(&self, class: Class) {
        // The transition is claimed atomically, so concurrent and repeated
        // calls run the class initializers exactly once.
        if !class.begin_finish() {
            return;
        }

        let extensions = self.extensions.read();
        for entry in extensions.entries() {
            if let Some(initializer) = entry.extension.class_initializer {
                class.with_extra_space(
                    entry.class_offset,
                    entry.extension.extra_class_space,
                    |space| initializer(class, space),
                );
            }
        }

        class.clear_in_construction();
    }

    /// Find a finished class by name.
    ///
    /// A class still in construction is not visible here.
    pub fn class_for_name(&self, name: &str) -> Option<Class> {
        let class = self.classes.read().get(name).copied()?;
        if class.is_in_construction() {
            return None;
        }
        Some(class)
    }

    /// The size in bytes of an instance of `class`, including extension
    /// object space.
    pub fn instance_size(&self, class: Class) -> usize {
        class.instance_size() + self.extensions.read().object_space()
    }

    /* ---- Method registration ---- */

    /// Add a single class-side method.
    pub fn add_class_method(&self, class: Class, method: Arc<Method>) {
        self.add_methods(class, MethodSide::Class, std::slice::from_ref(&method));
    }

    /// Add several class-side methods at once.
    pub fn add_class_methods(&self, class: Class, methods: &[Arc<Method>]) {
        self.add_methods(class, MethodSide::Class, methods);
    }

    /// Add a single instance-side method.
    pub fn add_instance_method(&self, class: Class, method: Arc<Method>) {
        self.add_methods(class, MethodSide::Instance, std::slice::from_ref(&method));
    }

    /// Add several instance-side methods at once.
    pub fn add_instance_methods(&self, class: Class, methods: &[Arc<Method>]) {
        self.add_methods(class, MethodSide::Instance, methods);
    }

    fn add_methods(&self, class: Class, side: MethodSide, methods: &[Arc<Method>]) {
        if methods.is_empty() {
            // Benign caller misuse.
            return;
        }

        class.push_methods(side, methods);

        // Flush only when demonstrably necessary: a new method can only
        // invalidate cached resolutions if it shadows something a
        // superclass already implements.
        let shadows = methods.iter().any(|method| {
            class
                .superclass_chain()
                .skip(1)
                .any(|ancestor| ancestor.lookup_own_method(side, method.selector).is_some())
        });
        if shadows {
            self.flush_side_below(class, side);
        }
    }

    /// Replace the implementation of `class`'s own class-side method.
    pub fn replace_class_method(
        &self,
        class: Class,
        selector: Sel,
        imp: Imp,
    ) -> Option<Arc<Method>> {
        self.replace_method(class, MethodSide::Class, selector, imp)
    }

    /// Replace the implementation of `class`'s own instance-side method.
    pub fn replace_instance_method(
        &self,
        class: Class,
        selector: Sel,
        imp: Imp,
    ) -> Option<Arc<Method>> {
        self.replace_method(class, MethodSide::Instance, selector, imp)
    }

    fn replace_method(
        &self,
        class: Class,
        side: MethodSide,
        selector: Sel,
        imp: Imp,
    ) -> Option<Arc<Method>> {
        let old = class.replace_own_method(side, selector, imp)?;
        // The old method may be cached anywhere below the mutated class.
        self.flush_side_below(class, side);
        Some(old)
    }

    /// Flush one side's cache on `class` and every class inheriting from it.
    fn flush_side_below(&self, class: Class, side: MethodSide) {
        let classes = self.classes.read();
        for candidate in classes.iter() {
            if candidate.descends_from(class) {
                candidate.cache(side).flush();
            }
        }
    }

    /* ---- Cache flushing ---- */

    /// Flush both of a class's method caches.
    pub fn flush_caches(&self, class: Class) {
        class.cache(MethodSide::Class).flush();
        class.cache(MethodSide::Instance).flush();
    }

    /// Flush a class's class-side cache only.
    pub fn flush_class_cache(&self, class: Class) {
        class.cache(MethodSide::Class).flush();
    }

    /// Flush a class's instance-side cache only.
    pub fn flush_instance_cache(&self, class: Class) {
        class.cache(MethodSide::Instance).flush();
    }

    /* ---- Instances ---- */

    /// Create an instance of a finished class.
    ///
    /// The instance block is zero-allocated at
    /// `instance_size + extension object space + extra_bytes`, then every
    /// extension's object initializer runs over its slice.
    pub fn create_instance(
        &self,
        class: Class,
        extra_bytes: usize,
    ) -> Result<Arc<Instance>, RuntimeError> {
        if class.is_in_construction() {
            return Err(RuntimeError::ClassInConstruction(class.name().to_string()));
        }

        let total = self.instance_size(class) + extra_bytes;
        let instance = Arc::new(Instance::new(class, total));
        self.initialize_extensions(&instance);
        Ok(instance)
    }

    /// Run every extension's object initializer over `instance`.
    ///
    /// `create_instance` does this automatically; callers that allocate on
    /// their own must do it themselves.
    pub fn initialize_extensions(&self, instance: &Instance) {
        let extensions = self.extensions.read();
        let base = instance.class().instance_size();
        for entry in extensions.entries() {
            if let Some(initializer) = entry.extension.object_initializer {
                instance.with_region(
                    base + entry.object_offset,
                    entry.extension.extra_object_space,
                    |space| initializer(instance.class(), space),
                );
            }
        }
    }

    /// Run every extension's object deallocator over `instance`.
    pub fn finalize_extensions(&self, instance: &Instance) {
        let extensions = self.extensions.read();
        let base = instance.class().instance_size();
        for entry in extensions.entries() {
            if let Some(deallocator) = entry.extension.object_deallocator {
                instance.with_region(
                    base + entry.object_offset,
                    entry.extension.extra_object_space,
                    |space| deallocator(instance.class(), space),
                );
            }
        }
    }

    /// Deallocate an instance: run extension deallocators, then drop this
    /// reference to it.
    pub fn deallocate_instance(&self, instance: Arc<Instance>) {
        self.finalize_extensions(&instance);
        drop(instance);
    }

    /* ---- Internals shared with the dispatch engine ---- */

    pub(crate) fn lookup_hooks(&self, side: MethodSide) -> Vec<crate::extension::LookupOverride> {
        let extensions = self.extensions.read();
        extensions
            .entries()
            .iter()
            .filter_map(|entry| match side {
                MethodSide::Class => entry.extension.class_lookup,
                MethodSide::Instance => entry.extension.instance_lookup,
            })
            .collect()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
