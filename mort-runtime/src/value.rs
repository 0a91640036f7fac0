//!
//! Facilities for manipulating values.
//!

use std::sync::Arc;

use crate::class::Class;
use crate::instance::Instance;
use crate::selectors::Sel;

/// Represents a value passed to or returned from a method implementation.
#[derive(Debug, Clone)]
pub enum Value {
    /// The **nil** value.
    Nil,
    /// A boolean value (**true** or **false**).
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Double(f64),
    /// An interned selector value.
    Symbol(Sel),
    /// A string value.
    String(Arc<String>),
    /// A bare class object.
    Class(Class),
    /// A generic class instance.
    Instance(Arc<Instance>),
}

impl Value {
    /// Whether this value is the boolean **true**.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Boolean(true))
    }

    /// Interpret this value as a dispatch receiver, if it is one.
    pub fn as_receiver(&self) -> Option<Receiver> {
        match self {
            Self::Nil => Some(Receiver::Null),
            Self::Class(class) => Some(Receiver::Class(*class)),
            Self::Instance(instance) => Some(Receiver::Instance(instance.clone())),
            _ => None,
        }
    }
}

/// The receiver of a message.
///
/// The receiver's kind is an explicit variant rather than a pointer-aliasing
/// trick: a class receiving a message gets class-side dispatch, an instance
/// gets instance-side dispatch, and the null receiver swallows any message.
#[derive(Debug, Clone)]
pub enum Receiver {
    /// The null receiver. Messages sent to it resolve to a no-op.
    Null,
    /// A class, receiving a class-side message.
    Class(Class),
    /// An instance, receiving an instance-side message.
    Instance(Arc<Instance>),
}

impl Receiver {
    /// The class that dispatch resolves against, if any.
    pub fn class(&self) -> Option<Class> {
        match self {
            Self::Null => None,
            Self::Class(class) => Some(*class),
            Self::Instance(instance) => Some(instance.class()),
        }
    }

    /// Whether this is the null receiver.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert this receiver into a plain value.
    pub fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Nil,
            Self::Class(class) => Value::Class(class),
            Self::Instance(instance) => Value::Instance(instance),
        }
    }
}

impl From<Class> for Receiver {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<Arc<Instance>> for Receiver {
    fn from(instance: Arc<Instance>) -> Self {
        Self::Instance(instance)
    }
}
