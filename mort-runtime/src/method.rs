//!
//! Facilities for manipulating class methods.
//!

use std::fmt;
use std::sync::Arc;

use crate::runtime::Runtime;
use crate::selectors::Sel;
use crate::value::{Receiver, Value};

/// A directly callable method implementation (just a bare function pointer).
///
/// The runtime is passed along so implementations can dispatch further
/// messages, create instances, and so on.
pub type Imp = fn(runtime: &Runtime, receiver: Receiver, selector: Sel, args: &[Value]) -> Value;

/// Represents a class method: a selector, its type encoding, and the
/// compiled implementation.
///
/// Methods are immutable once created and always shared: a single method may
/// be referenced by a method list and any number of caches at once, so
/// method identity is `Arc` pointer identity.
pub struct Method {
    /// The selector this method answers to.
    pub selector: Sel,
    /// The type encoding string describing the implementation's signature.
    pub types: String,
    /// The implementation function pointer.
    pub imp: Imp,
}

impl Method {
    /// Create a new shared method.
    pub fn new(selector: Sel, types: impl Into<String>, imp: Imp) -> Arc<Self> {
        Arc::new(Self {
            selector,
            types: types.into(),
            imp,
        })
    }

    /// Get this method's implementation pointer.
    pub fn implementation(&self) -> Imp {
        self.imp
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("selector", &self.selector)
            .field("types", &self.types)
            .finish()
    }
}
