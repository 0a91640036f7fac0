//!
//! This is the MORT object runtime: a dynamically-typed object model with
//! classes, single inheritance and late-bound message dispatch.
//!
//! Callers register classes and methods at run time; the dispatch engine
//! resolves a (receiver, selector) pair to a concrete function pointer
//! through per-class method caches, class extensions and the superclass
//! chain, falling back to message forwarding.
//!

/// Per-class caching of resolved methods.
pub mod cache;
/// Facilities for manipulating classes.
pub mod class;
/// The dispatch engine: lookup, forwarding and super dispatch.
pub mod dispatch;
/// The runtime's recoverable error conditions.
pub mod error;
/// The class extension mechanism.
pub mod extension;
/// Facilities for manipulating class instances.
pub mod instance;
/// Facilities for manipulating instance variables.
pub mod ivar;
/// Facilities for manipulating class methods.
pub mod method;
/// The central runtime state: registries and class lifecycle.
pub mod runtime;
/// Facilities for registering and interning selectors.
pub mod selectors;
/// Facilities for manipulating values.
pub mod value;

pub use crate::cache::MethodCache;
pub use crate::class::Class;
pub use crate::dispatch::{noop_imp, SuperContext};
pub use crate::error::RuntimeError;
pub use crate::extension::{ClassExtension, ExtensionId};
pub use crate::instance::Instance;
pub use crate::ivar::Ivar;
pub use crate::method::{Imp, Method};
pub use crate::runtime::Runtime;
pub use crate::selectors::Sel;
pub use crate::value::{Receiver, Value};
