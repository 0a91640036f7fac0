//!
//! The dispatch engine: lookup, forwarding and super dispatch.
//!
//! Resolution order for a (receiver, selector) pair:
//!
//! 1. a null receiver resolves to a no-op implementation immediately;
//! 2. the receiver's kind picks the class- or instance-side of its class;
//! 3. that side's cache is consulted (read lock only, the fast path);
//! 4. on a miss, extension lookup overrides get the first shot, in
//!    registration order;
//! 5. then the superclass chain is walked, searching each class's own
//!    method list linearly; the first match wins;
//! 6. any resolution is cached before returning;
//! 7. an unresolved selector escalates through `forwardMessage:`; if that
//!    is absent or declines, the process aborts. There is no recoverable
//!    "method not found" on the dispatch path.
//!

use std::sync::Arc;

use crate::class::{Class, MethodSide};
use crate::instance::Instance;
use crate::method::{Imp, Method};
use crate::runtime::Runtime;
use crate::selectors::Sel;
use crate::value::{Receiver, Value};

/// The implementation every message to a null receiver (and every forwarded
/// message) resolves to.
pub fn noop_imp(_: &Runtime, _: Receiver, _: Sel, _: &[Value]) -> Value {
    Value::Nil
}

/// A super-dispatch context: the original receiver plus the class the
/// search should start at (usually the sender's superclass).
#[derive(Debug, Clone)]
pub struct SuperContext {
    /// The receiver of the message.
    pub receiver: Receiver,
    /// The class the hierarchy search starts at.
    pub class: Class,
}

impl Runtime {
    /// Search for a class-side method, without touching the caches.
    ///
    /// Extension overrides are consulted first, then the hierarchy.
    pub fn lookup_class_method(&self, class: Class, selector: Sel) -> Option<Arc<Method>> {
        self.resolve(MethodSide::Class, class, selector)
    }

    /// Search for an instance-side method, without touching the caches.
    pub fn lookup_instance_method(&self, class: Class, selector: Sel) -> Option<Arc<Method>> {
        self.resolve(MethodSide::Instance, class, selector)
    }

    /// Resolve a message send to a callable implementation.
    ///
    /// This never returns a "not found" result: a null receiver gets a
    /// no-op, an unresolvable selector escalates through forwarding, and a
    /// declined forward aborts the process.
    pub fn lookup_imp(&self, receiver: &Receiver, selector: Sel) -> Imp {
        let (side, class) = match receiver {
            Receiver::Null => return noop_imp,
            Receiver::Class(class) => (MethodSide::Class, *class),
            Receiver::Instance(instance) => (MethodSide::Instance, instance.class()),
        };

        match self.cached_imp(side, class, selector) {
            Some(imp) => imp,
            None => self.forward_or_abort(receiver, class, side, selector),
        }
    }

    /// Resolve a class-side message on `class`.
    pub fn lookup_class_imp(&self, class: Class, selector: Sel) -> Imp {
        self.lookup_imp(&Receiver::Class(class), selector)
    }

    /// Resolve an instance-side message on `instance`.
    pub fn lookup_instance_imp(&self, instance: &Arc<Instance>, selector: Sel) -> Imp {
        self.lookup_imp(&Receiver::Instance(instance.clone()), selector)
    }

    /// Resolve a message starting the hierarchy search at a given class
    /// (the `super` send of a compiled method).
    ///
    /// The resolution is cached on the starting class, where it is valid.
    /// Forwarding still belongs to the receiver: a failed super send asks
    /// the receiver's own class to forward, not the super context class.
    pub fn lookup_imp_super(&self, context: &SuperContext, selector: Sel) -> Imp {
        let (side, receiver_class) = match &context.receiver {
            Receiver::Null => return noop_imp,
            Receiver::Class(class) => (MethodSide::Class, *class),
            Receiver::Instance(instance) => (MethodSide::Instance, instance.class()),
        };

        match self.cached_imp(side, context.class, selector) {
            Some(imp) => imp,
            None => self.forward_or_abort(&context.receiver, receiver_class, side, selector),
        }
    }

    /// Cache-first resolution: fetch, or resolve and fill the cache.
    fn cached_imp(&self, side: MethodSide, class: Class, selector: Sel) -> Option<Imp> {
        if let Some(method) = class.cache(side).fetch(selector) {
            return Some(method.imp);
        }

        let method = self.resolve(side, class, selector)?;
        class.cache(side).insert(method.clone());
        Some(method.imp)
    }

    /// Full resolution: extension overrides first, then the hierarchy walk.
    fn resolve(&self, side: MethodSide, class: Class, selector: Sel) -> Option<Arc<Method>> {
        // Hooks are copied out so no runtime lock is held while they run.
        for hook in self.lookup_hooks(side) {
            if let Some(method) = hook(class, selector) {
                return Some(method);
            }
        }

        class
            .superclass_chain()
            .find_map(|ancestor| ancestor.lookup_own_method(side, selector))
    }

    /// Last resort: ask the receiver to forward the message, or abort.
    fn forward_or_abort(
        &self,
        receiver: &Receiver,
        class: Class,
        side: MethodSide,
        selector: Sel,
    ) -> Imp {
        // Never try to forward the forwarding selector itself.
        if selector != self.forward_selector() {
            if let Some(imp) = self.cached_imp(side, class, self.forward_selector()) {
                let handled = imp(
                    self,
                    receiver.clone(),
                    self.forward_selector(),
                    &[Value::Symbol(selector)],
                );
                if handled.is_true() {
                    return noop_imp;
                }
                panic!(
                    "class '{}' declined to forward selector '{}'",
                    class.name(),
                    self.selector_name(selector)
                );
            }
        }

        panic!(
            "class '{}' does not respond to selector '{}' and does not support forwarding",
            class.name(),
            self.selector_name(selector)
        );
    }
}
