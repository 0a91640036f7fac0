//!
//! Facilities for manipulating class instances.
//!
//! An instance is its class handle plus one zero-initialized byte block
//! holding the ivars (addressed by their precomputed offsets), the
//! extension extra space, and any caller-requested extra bytes. Access
//! goes through safe, bounds-checked slicing; a bounds violation is a
//! programming error and aborts.
//!

use parking_lot::RwLock;

use crate::class::Class;
use crate::ivar::Ivar;

/// Represents a class instance.
pub struct Instance {
    class: Class,
    fields: RwLock<Box<[u8]>>,
}

impl Instance {
    /// Allocate a zeroed instance block of `total_size` bytes.
    pub(crate) fn new(class: Class, total_size: usize) -> Self {
        Self {
            class,
            fields: RwLock::new(vec![0u8; total_size].into_boxed_slice()),
        }
    }

    /// Get the class of this instance.
    pub fn class(&self) -> Class {
        self.class
    }

    /// The total size of this instance's byte block (ivars, extension
    /// space and extra bytes).
    pub fn size(&self) -> usize {
        self.fields.read().len()
    }

    /// Copy out the bytes of an instance variable.
    pub fn get_variable(&self, ivar: &Ivar) -> Vec<u8> {
        let fields = self.fields.read();
        let range = ivar.byte_range();
        if range.end > fields.len() {
            panic!(
                "ivar '{}' out of bounds on instance of '{}' ({} / {})",
                ivar.name,
                self.class.name(),
                range.end,
                fields.len()
            );
        }
        fields[range].to_vec()
    }

    /// Overwrite the bytes of an instance variable.
    ///
    /// The byte count must match the ivar's declared size exactly.
    pub fn set_variable(&self, ivar: &Ivar, bytes: &[u8]) {
        if bytes.len() != ivar.size {
            panic!(
                "ivar '{}' size mismatch ({} / {})",
                ivar.name,
                bytes.len(),
                ivar.size
            );
        }
        self.update_variable(ivar, |slot| slot.copy_from_slice(bytes));
    }

    /// Run `f` over the bytes of an instance variable, in place.
    pub fn update_variable<R>(&self, ivar: &Ivar, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let range = ivar.byte_range();
        self.with_region(range.start, ivar.size, f)
    }

    /// Copy out an instance variable's bytes by name, searching the
    /// superclass chain for the declaration.
    pub fn get_variable_named(&self, name: &str) -> Option<Vec<u8>> {
        let ivar = self.class.ivar_named(name)?;
        Some(self.get_variable(&ivar))
    }

    /// Overwrite an instance variable's bytes by name.
    ///
    /// Returns `false` if no such ivar is declared anywhere up the chain.
    pub fn set_variable_named(&self, name: &str, bytes: &[u8]) -> bool {
        match self.class.ivar_named(name) {
            Some(ivar) => {
                self.set_variable(&ivar, bytes);
                true
            }
            None => false,
        }
    }

    /// Run `f` over an arbitrary byte region (used for extension space).
    pub(crate) fn with_region<R>(
        &self,
        offset: usize,
        len: usize,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        let mut fields = self.fields.write();
        let end = offset + len;
        if end > fields.len() {
            panic!(
                "byte region out of bounds on instance of '{}' ({} / {})",
                self.class.name(),
                end,
                fields.len()
            );
        }
        f(&mut fields[offset..end])
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("size", &self.size())
            .finish()
    }
}
