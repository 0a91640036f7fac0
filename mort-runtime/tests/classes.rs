use std::sync::Arc;
use std::thread;

use mort_runtime::class::ISA_SLOT_SIZE;
use mort_runtime::{Receiver, Runtime, RuntimeError};

#[test]
fn selector_interning_test() {
    let runtime = Runtime::new();

    let first = runtime.register_selector("doSomething:with:");
    let second = runtime.register_selector("doSomething:with:");
    let other = runtime.register_selector("doSomethingElse");

    assert_eq!(first, second, "selector handles should be canonical");
    assert_ne!(first, other, "distinct names should get distinct handles");

    // Equal contents in distinct buffers still intern to the same handle.
    let buffer = String::from("doSomething:with:");
    assert_eq!(runtime.register_selector(&buffer), first);

    assert_eq!(runtime.selector_name(first), "doSomething:with:");
    assert_eq!(runtime.selector_name(other), "doSomethingElse");
}

#[test]
fn selector_cross_thread_test() {
    let runtime = Arc::new(Runtime::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let runtime = runtime.clone();
            thread::spawn(move || runtime.register_selector("sharedSelector"))
        })
        .collect();

    let selectors: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("registration thread panicked"))
        .collect();

    for selector in &selectors {
        assert_eq!(*selector, selectors[0]);
    }
}

#[test]
fn class_registration_test() {
    let runtime = Runtime::new();

    let object = runtime.create_class(None, "Object").expect("creation failed");
    runtime.finish_class(object);
    let point = runtime
        .create_class(Some(object), "Point")
        .expect("creation failed");
    runtime.finish_class(point);

    assert_eq!(object.name(), "Object");
    assert_eq!(object.superclass(), None);
    assert_eq!(point.superclass(), Some(object));

    assert_eq!(runtime.class_for_name("Object"), Some(object));
    assert_eq!(runtime.class_for_name("Point"), Some(point));
    assert_eq!(runtime.class_for_name("Missing"), None);

    assert!(point.descends_from(object));
    assert!(point.descends_from(point));
    assert!(!object.descends_from(point));
}

#[test]
fn duplicate_class_name_test() {
    let runtime = Runtime::new();

    let first = runtime.create_class(None, "Object").expect("creation failed");
    runtime.finish_class(first);

    let duplicate = runtime.create_class(None, "Object");
    assert!(matches!(
        duplicate,
        Err(RuntimeError::DuplicateClassName(ref name)) if name == "Object"
    ));

    // The original registration is untouched.
    assert_eq!(runtime.class_for_name("Object"), Some(first));
}

#[test]
fn construction_gating_test() {
    let runtime = Runtime::new();

    let class = runtime.create_class(None, "Object").expect("creation failed");
    assert!(class.is_in_construction());

    // Invisible and not instantiable until finished.
    assert_eq!(runtime.class_for_name("Object"), None);
    assert!(matches!(
        runtime.create_instance(class, 0),
        Err(RuntimeError::ClassInConstruction(_))
    ));

    runtime.finish_class(class);
    assert!(!class.is_in_construction());
    assert_eq!(runtime.class_for_name("Object"), Some(class));
    assert!(runtime.create_instance(class, 0).is_ok());

    // Finishing twice is a no-op.
    runtime.finish_class(class);
}

#[test]
fn ivar_layout_test() {
    let runtime = Runtime::new();
    let class = runtime.create_class(None, "Object").expect("creation failed");

    let a = class.add_ivar("a", 4, 4, "i").expect("declaration failed");
    let b = class.add_ivar("b", 8, 8, "q").expect("declaration failed");
    let c = class.add_ivar("c", 1, 1, "c").expect("declaration failed");

    // The block leads with the class slot; ivars are laid out in
    // declaration order, each aligned up from the previous end.
    assert_eq!(a.offset, ISA_SLOT_SIZE);
    assert_eq!(b.offset, ISA_SLOT_SIZE + 8);
    assert_eq!(c.offset, ISA_SLOT_SIZE + 16);
    assert_eq!(class.instance_size(), ISA_SLOT_SIZE + 17);

    runtime.finish_class(class);
    assert_eq!(runtime.instance_size(class), class.instance_size());
}

#[test]
fn duplicate_ivar_test() {
    let runtime = Runtime::new();
    let class = runtime.create_class(None, "Object").expect("creation failed");
    class.add_ivar("value", 8, 8, "q").expect("declaration failed");

    assert!(matches!(
        class.add_ivar("value", 4, 4, "i"),
        Err(RuntimeError::DuplicateIvarName { ref name, .. }) if name == "value"
    ));
}

#[test]
fn ivar_shadowing_test() {
    let runtime = Runtime::new();

    let base = runtime.create_class(None, "Base").expect("creation failed");
    let base_value = base.add_ivar("value", 8, 8, "q").expect("declaration failed");
    runtime.finish_class(base);

    let derived = runtime
        .create_class(Some(base), "Derived")
        .expect("creation failed");
    let derived_value = derived
        .add_ivar("value", 8, 8, "q")
        .expect("declaration failed");
    runtime.finish_class(derived);

    // Shadowing across the hierarchy is allowed and the most derived
    // declaration wins on lookup.
    assert_ne!(base_value.offset, derived_value.offset);
    let found = derived.ivar_named("value").expect("lookup failed");
    assert_eq!(found.offset, derived_value.offset);
    let found = base.ivar_named("value").expect("lookup failed");
    assert_eq!(found.offset, base_value.offset);
}

#[test]
fn ivar_after_finish_test() {
    let runtime = Runtime::new();
    let class = runtime.create_class(None, "Object").expect("creation failed");
    runtime.finish_class(class);

    assert!(matches!(
        class.add_ivar("late", 8, 8, "q"),
        Err(RuntimeError::ClassAlreadyFinished(_))
    ));
}

#[test]
fn instance_variables_test() {
    let runtime = Runtime::new();
    let class = runtime.create_class(None, "Object").expect("creation failed");
    let value = class.add_ivar("value", 8, 8, "q").expect("declaration failed");
    runtime.finish_class(class);

    let instance = runtime.create_instance(class, 0).expect("creation failed");

    // Freshly created instances are zeroed.
    assert_eq!(instance.get_variable(&value), vec![0u8; 8]);

    instance.set_variable(&value, &42i64.to_ne_bytes());
    assert_eq!(instance.get_variable(&value), 42i64.to_ne_bytes().to_vec());

    // The by-name path goes through the same storage.
    assert!(instance.set_variable_named("value", &7i64.to_ne_bytes()));
    let bytes = instance.get_variable_named("value").expect("lookup failed");
    assert_eq!(bytes, 7i64.to_ne_bytes().to_vec());

    assert_eq!(instance.get_variable_named("missing"), None);
    assert!(!instance.set_variable_named("missing", &[0u8; 8]));
}

#[test]
fn extra_bytes_test() {
    let runtime = Runtime::new();
    let class = runtime.create_class(None, "Object").expect("creation failed");
    class.add_ivar("value", 8, 8, "q").expect("declaration failed");
    runtime.finish_class(class);

    let plain = runtime.create_instance(class, 0).expect("creation failed");
    let padded = runtime.create_instance(class, 32).expect("creation failed");

    assert_eq!(plain.size(), runtime.instance_size(class));
    assert_eq!(padded.size(), runtime.instance_size(class) + 32);
}

#[test]
fn null_receiver_test() {
    let runtime = Runtime::new();
    let receiver = Receiver::Null;

    assert!(receiver.is_null());
    assert_eq!(receiver.class(), None);

    // Any message to the null receiver is swallowed.
    let selector = runtime.register_selector("anythingAtAll");
    let imp = runtime.lookup_imp(&receiver, selector);
    let result = imp(&runtime, receiver, selector, &[]);
    assert!(matches!(result, mort_runtime::Value::Nil));
}
