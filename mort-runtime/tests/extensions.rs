use std::convert::TryInto;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mort_runtime::{
    Class, ClassExtension, Method, Receiver, Runtime, RuntimeError, Sel, Value,
};

const CLASS_MAGIC: u64 = 0xC1A5_C1A5_C1A5_C1A5;
const OBJECT_MAGIC: u64 = 0x0B1E_0B1E_0B1E_0B1E;

static DEALLOCATIONS: AtomicUsize = AtomicUsize::new(0);
static CLASS_INITIALIZATIONS: AtomicUsize = AtomicUsize::new(0);

fn stamp_class_space(_: Class, space: &mut [u8]) {
    space.copy_from_slice(&CLASS_MAGIC.to_ne_bytes());
}

fn stamp_object_space(_: Class, space: &mut [u8]) {
    space.copy_from_slice(&OBJECT_MAGIC.to_ne_bytes());
}

fn count_deallocation(_: Class, _: &mut [u8]) {
    DEALLOCATIONS.fetch_add(1, Ordering::SeqCst);
}

fn count_class_initialization(_: Class, _: &mut [u8]) {
    CLASS_INITIALIZATIONS.fetch_add(1, Ordering::SeqCst);
}

fn intercept_lookup(_: Class, selector: Sel) -> Option<Arc<Method>> {
    Some(Method::new(selector, "q@:", intercepted_imp))
}

fn intercepted_imp(_: &Runtime, _: Receiver, _: Sel, _: &[Value]) -> Value {
    Value::Integer(42)
}

fn read_u64(space: &[u8]) -> u64 {
    u64::from_ne_bytes(space.try_into().expect("space is 8 bytes"))
}

#[test]
fn extension_spaces_test() {
    let runtime = Runtime::new();

    let id = runtime
        .register_extension(ClassExtension {
            class_initializer: Some(stamp_class_space),
            object_initializer: Some(stamp_object_space),
            extra_class_space: 8,
            extra_object_space: 8,
            ..ClassExtension::default()
        })
        .expect("registration failed");

    let class = runtime.create_class(None, "Object").expect("creation failed");
    class.add_ivar("value", 8, 8, "q").expect("declaration failed");

    // Class space is initialized when the class is finished, not before.
    let before = runtime.with_class_space(id, class, |space| read_u64(space));
    assert_eq!(before, 0);
    runtime.finish_class(class);
    let after = runtime.with_class_space(id, class, |space| read_u64(space));
    assert_eq!(after, CLASS_MAGIC);

    // Instances carry the extension's object space past the ivar block.
    assert_eq!(runtime.instance_size(class), class.instance_size() + 8);
    let instance = runtime.create_instance(class, 0).expect("creation failed");
    let stamped = runtime.with_object_space(id, &instance, |space| read_u64(space));
    assert_eq!(stamped, OBJECT_MAGIC);

    // The ivar block itself is untouched by the extension.
    let value = class.ivar_named("value").expect("lookup failed");
    assert_eq!(instance.get_variable(&value), vec![0u8; 8]);
}

#[test]
fn extension_offsets_test() {
    let runtime = Runtime::new();

    let first = runtime
        .register_extension(ClassExtension {
            extra_object_space: 8,
            ..ClassExtension::default()
        })
        .expect("registration failed");
    let second = runtime
        .register_extension(ClassExtension {
            extra_object_space: 8,
            ..ClassExtension::default()
        })
        .expect("registration failed");

    let class = runtime.create_class(None, "Object").expect("creation failed");
    runtime.finish_class(class);
    let instance = runtime.create_instance(class, 0).expect("creation failed");

    // Each extension owns a disjoint slice of the object space.
    runtime.with_object_space(first, &instance, |space| {
        space.copy_from_slice(&1u64.to_ne_bytes())
    });
    runtime.with_object_space(second, &instance, |space| {
        space.copy_from_slice(&2u64.to_ne_bytes())
    });

    let first_read = runtime.with_object_space(first, &instance, |space| read_u64(space));
    let second_read = runtime.with_object_space(second, &instance, |space| read_u64(space));
    assert_eq!(first_read, 1);
    assert_eq!(second_read, 2);
}

#[test]
fn extensions_frozen_test() {
    let runtime = Runtime::new();

    let class = runtime.create_class(None, "Object").expect("creation failed");
    runtime.finish_class(class);

    // The first class creation froze the set.
    let late = runtime.register_extension(ClassExtension::default());
    assert!(matches!(late, Err(RuntimeError::ExtensionsFrozen)));
}

#[test]
fn lookup_override_test() {
    let runtime = Runtime::new();

    runtime
        .register_extension(ClassExtension {
            instance_lookup: Some(intercept_lookup),
            ..ClassExtension::default()
        })
        .expect("registration failed");

    // The class implements nothing itself; the extension resolves
    // everything on the instance side.
    let class = runtime.create_class(None, "Hollow").expect("creation failed");
    runtime.finish_class(class);
    let instance = runtime.create_instance(class, 0).expect("creation failed");
    let receiver = Receiver::Instance(instance);
    let selector = runtime.register_selector("whatever");

    for _ in 0..3 {
        let imp = runtime.lookup_imp(&receiver, selector);
        let result = imp(&runtime, receiver.clone(), selector, &[]);
        assert!(matches!(result, Value::Integer(42)));
    }

    // The class side has no override hook and resolves nothing.
    assert!(runtime.lookup_class_method(class, selector).is_none());
}

#[test]
fn finish_class_runs_initializers_once_test() {
    let runtime = Arc::new(Runtime::new());

    runtime
        .register_extension(ClassExtension {
            class_initializer: Some(count_class_initialization),
            extra_class_space: 8,
            ..ClassExtension::default()
        })
        .expect("registration failed");

    let class = runtime.create_class(None, "Object").expect("creation failed");

    // Racing finishers must not run the class initializers twice.
    let before = CLASS_INITIALIZATIONS.load(Ordering::SeqCst);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let runtime = runtime.clone();
            std::thread::spawn(move || runtime.finish_class(class))
        })
        .collect();
    for handle in handles {
        handle.join().expect("finishing thread panicked");
    }

    assert!(!class.is_in_construction());
    assert_eq!(CLASS_INITIALIZATIONS.load(Ordering::SeqCst) - before, 1);

    // Neither does a later repeat.
    runtime.finish_class(class);
    assert_eq!(CLASS_INITIALIZATIONS.load(Ordering::SeqCst) - before, 1);
}

#[test]
fn object_deallocator_test() {
    let runtime = Runtime::new();

    runtime
        .register_extension(ClassExtension {
            object_deallocator: Some(count_deallocation),
            extra_object_space: 8,
            ..ClassExtension::default()
        })
        .expect("registration failed");

    let class = runtime.create_class(None, "Object").expect("creation failed");
    runtime.finish_class(class);

    let before = DEALLOCATIONS.load(Ordering::SeqCst);
    let instance = runtime.create_instance(class, 0).expect("creation failed");
    runtime.deallocate_instance(instance);
    let after = DEALLOCATIONS.load(Ordering::SeqCst);
    assert_eq!(after - before, 1);
}
