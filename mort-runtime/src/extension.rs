//!
//! The class extension mechanism.
//!
//! An extension grafts extra per-class and per-object storage onto every
//! class and instance, plus lifecycle callbacks and an optional hook into
//! method lookup, without the core runtime knowing its purpose. Extensions
//! register before the runtime creates its first class; at that point the
//! set freezes, the per-extension offsets are computed once, and later
//! registrations are rejected with a typed error.
//!

use std::sync::Arc;

use crate::class::Class;
use crate::error::RuntimeError;
use crate::method::Method;
use crate::selectors::Sel;

/// Initializes an extension's sub-slice of a class's extra space.
pub type ClassInitializer = fn(class: Class, space: &mut [u8]);
/// Initializes an extension's sub-slice of a new instance's extra space.
pub type ObjectInitializer = fn(class: Class, space: &mut [u8]);
/// Tears down an extension's sub-slice when an instance is deallocated.
pub type ObjectDeallocator = fn(class: Class, space: &mut [u8]);
/// Lets an extension resolve a selector before the hierarchy is searched.
pub type LookupOverride = fn(class: Class, selector: Sel) -> Option<Arc<Method>>;

/// A class extension descriptor.
///
/// Every hook is optional; a descriptor with only extra space requests is
/// perfectly valid.
#[derive(Debug, Clone, Default)]
pub struct ClassExtension {
    /// Called for every class when it is finished.
    pub class_initializer: Option<ClassInitializer>,
    /// Called for every instance when it is created.
    pub object_initializer: Option<ObjectInitializer>,
    /// Called for every instance when it is deallocated.
    pub object_deallocator: Option<ObjectDeallocator>,
    /// Consulted on class-side cache misses, before the hierarchy walk.
    pub class_lookup: Option<LookupOverride>,
    /// Consulted on instance-side cache misses, before the hierarchy walk.
    pub instance_lookup: Option<LookupOverride>,
    /// Extra bytes requested in every class structure.
    pub extra_class_space: usize,
    /// Extra bytes requested in every instance.
    pub extra_object_space: usize,
}

/// Identifies a registered extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionId(pub(crate) usize);

/// An extension with its offsets into the extra-space blocks, computed once
/// when the set freezes.
pub(crate) struct RegisteredExtension {
    pub extension: ClassExtension,
    pub class_offset: usize,
    pub object_offset: usize,
}

/// The process-wide set of registered extensions.
///
/// Two-phase lifecycle: mutable while the runtime has no classes, then
/// frozen forever. Extensions are consulted in registration order.
pub(crate) struct ExtensionSet {
    entries: Vec<RegisteredExtension>,
    frozen: bool,
    class_space: usize,
    object_space: usize,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            frozen: false,
            class_space: 0,
            object_space: 0,
        }
    }

    pub fn register(&mut self, extension: ClassExtension) -> Result<ExtensionId, RuntimeError> {
        if self.frozen {
            return Err(RuntimeError::ExtensionsFrozen);
        }
        let id = ExtensionId(self.entries.len());
        self.entries.push(RegisteredExtension {
            extension,
            class_offset: 0,
            object_offset: 0,
        });
        Ok(id)
    }

    /// Freeze the set and precompute every extension's offsets.
    ///
    /// Idempotent; called when the first class is created.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        self.frozen = true;

        let mut class_offset = 0;
        let mut object_offset = 0;
        for entry in &mut self.entries {
            entry.class_offset = class_offset;
            entry.object_offset = object_offset;
            class_offset += entry.extension.extra_class_space;
            object_offset += entry.extension.extra_object_space;
        }
        self.class_space = class_offset;
        self.object_space = object_offset;
    }

    pub fn entries(&self) -> &[RegisteredExtension] {
        &self.entries
    }

    pub fn get(&self, id: ExtensionId) -> &RegisteredExtension {
        match self.entries.get(id.0) {
            Some(entry) => entry,
            None => panic!("unknown extension id ({})", id.0),
        }
    }

    /// Total extra class space requested by all extensions.
    pub fn class_space(&self) -> usize {
        self.class_space
    }

    /// Total extra object space requested by all extensions.
    pub fn object_space(&self) -> usize {
        self.object_space
    }
}
