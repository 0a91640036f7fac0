//!
//! The runtime's recoverable error conditions.
//!
//! Only caller-reportable failures live here. Programming errors (index
//! violations, unresolvable dispatch once forwarding declines) abort the
//! process by panicking instead; there is no recoverable "method not found"
//! by design.
//!

use thiserror::Error;

/// A recoverable runtime error, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A class with the given name is already registered.
    #[error("a class named '{0}' already exists")]
    DuplicateClassName(String),

    /// The class already declares an ivar with the given name.
    ///
    /// Shadowing an ivar of a superclass is allowed; duplicating one within
    /// a single class is not.
    #[error("class '{class}' already declares an ivar named '{name}'")]
    DuplicateIvarName {
        /// The declaring class's name.
        class: String,
        /// The duplicated ivar name.
        name: String,
    },

    /// The class is still in construction and cannot be used this way yet.
    #[error("class '{0}' is still under construction")]
    ClassInConstruction(String),

    /// The class has been finished; structural mutation is no longer allowed.
    #[error("class '{0}' has already been finished")]
    ClassAlreadyFinished(String),

    /// The extension list froze when the first class was created.
    #[error("extensions cannot be registered once a class has been created")]
    ExtensionsFrozen,
}
