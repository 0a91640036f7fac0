//!
//! Benchmark drivers for the MORT runtime.
//!
//! Each scenario registers a small class pair and hammers one dispatch
//! path, verifying the observable side effects afterwards.
//!

use std::convert::TryInto;
use std::time::Instant;

use anyhow::bail;
use structopt::StructOpt;

use mort_runtime::{Class, Instance, Method, Receiver, Runtime, Sel, SuperContext, Value};

#[derive(Debug, Clone, PartialEq, StructOpt)]
#[structopt(about, author)]
struct Options {
    /// Scenario to run (dispatch, super-dispatch, ivar, forwarding, allocation).
    scenario: String,

    /// Number of iterations to perform.
    #[structopt(long, short, default_value = "1000000")]
    iterations: u64,

    /// Enable verbose output (with timing information).
    #[structopt(short = "v")]
    verbose: bool,
}

fn read_count(instance: &Instance) -> i64 {
    let bytes = instance.get_variable_named("count").expect("count ivar");
    i64::from_ne_bytes(bytes.as_slice().try_into().expect("count is 8 bytes"))
}

fn bump_count(instance: &Instance, by: i64) {
    let ivar = instance.class().ivar_named("count").expect("count ivar");
    instance.update_variable(&ivar, |bytes| {
        let value = i64::from_ne_bytes((&*bytes).try_into().expect("count is 8 bytes"));
        bytes.copy_from_slice(&(value + by).to_ne_bytes());
    });
}

fn increment_imp(_: &Runtime, receiver: Receiver, _: Sel, _: &[Value]) -> Value {
    if let Receiver::Instance(instance) = &receiver {
        bump_count(instance, 1);
    }
    Value::Nil
}

/// The subclass override: sends `increment` to super, then bumps again.
fn sub_increment_imp(runtime: &Runtime, receiver: Receiver, selector: Sel, args: &[Value]) -> Value {
    if let Receiver::Instance(instance) = &receiver {
        let superclass = instance.class().superclass().expect("MySubclass has a superclass");
        let context = SuperContext {
            receiver: receiver.clone(),
            class: superclass,
        };
        let super_imp = runtime.lookup_imp_super(&context, selector);
        super_imp(runtime, receiver.clone(), selector, args);

        bump_count(instance, 1);
    }
    Value::Nil
}

/// Increments through the by-name accessor path instead of a cached handle.
fn accessor_increment_imp(_: &Runtime, receiver: Receiver, _: Sel, _: &[Value]) -> Value {
    if let Receiver::Instance(instance) = &receiver {
        let bytes = instance.get_variable_named("count").expect("count ivar");
        let value = i64::from_ne_bytes(bytes.as_slice().try_into().expect("count is 8 bytes"));
        instance.set_variable_named("count", &(value + 1).to_ne_bytes());
    }
    Value::Nil
}

fn alloc_imp(runtime: &Runtime, receiver: Receiver, _: Sel, _: &[Value]) -> Value {
    match receiver {
        Receiver::Class(class) => match runtime.create_instance(class, 0) {
            Ok(instance) => Value::Instance(instance),
            Err(_) => Value::Nil,
        },
        _ => Value::Nil,
    }
}

fn forward_imp(_: &Runtime, _: Receiver, _: Sel, _: &[Value]) -> Value {
    Value::Boolean(true)
}

fn register_classes(runtime: &Runtime) -> anyhow::Result<(Class, Class)> {
    let increment = runtime.register_selector("increment");
    let increment_via_accessors = runtime.register_selector("incrementViaAccessors");
    let alloc = runtime.register_selector("alloc");

    let my_class = runtime.create_class(None, "MyClass")?;
    my_class.add_ivar("count", 8, 8, "q")?;
    runtime.add_class_method(my_class, Method::new(alloc, "@@:", alloc_imp));
    runtime.add_instance_method(my_class, Method::new(increment, "v@:", increment_imp));
    runtime.add_instance_method(
        my_class,
        Method::new(increment_via_accessors, "v@:", accessor_increment_imp),
    );
    runtime.add_instance_method(
        my_class,
        Method::new(runtime.forward_selector(), "B@::", forward_imp),
    );
    runtime.finish_class(my_class);

    let my_subclass = runtime.create_class(Some(my_class), "MySubclass")?;
    runtime.add_instance_method(my_subclass, Method::new(increment, "v@:", sub_increment_imp));
    runtime.finish_class(my_subclass);

    Ok((my_class, my_subclass))
}

fn run_increments(
    runtime: &Runtime,
    class: Class,
    selector_name: &str,
    iterations: u64,
    expected_per_send: i64,
) -> anyhow::Result<()> {
    let instance = runtime.create_instance(class, 0)?;
    let selector = runtime.register_selector(selector_name);
    let receiver = Receiver::Instance(instance.clone());

    for _ in 0..iterations {
        let imp = runtime.lookup_imp(&receiver, selector);
        imp(runtime, receiver.clone(), selector, &[]);
    }

    let expected = iterations as i64 * expected_per_send;
    let count = read_count(&instance);
    if count != expected {
        bail!("expected a count of {}, got {}", expected, count);
    }
    Ok(())
}

fn run_forwarding(runtime: &Runtime, class: Class, iterations: u64) -> anyhow::Result<()> {
    let instance = runtime.create_instance(class, 0)?;
    let selector = runtime.register_selector("unknownSelector:");
    let receiver = Receiver::Instance(instance);

    for i in 0..iterations {
        let imp = runtime.lookup_imp(&receiver, selector);
        imp(runtime, receiver.clone(), selector, &[Value::Integer(i as i64)]);
    }
    Ok(())
}

fn run_allocation(runtime: &Runtime, class: Class, iterations: u64) -> anyhow::Result<()> {
    let selector = runtime.register_selector("alloc");
    let receiver = Receiver::Class(class);

    for _ in 0..iterations {
        let imp = runtime.lookup_imp(&receiver, selector);
        match imp(runtime, receiver.clone(), selector, &[]) {
            Value::Instance(instance) => runtime.deallocate_instance(instance),
            _ => bail!("'alloc' did not produce an instance"),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let opts = Options::from_args();

    let runtime = Runtime::new();
    let (my_class, my_subclass) = register_classes(&runtime)?;

    let started = Instant::now();
    match opts.scenario.as_str() {
        "dispatch" => run_increments(&runtime, my_class, "increment", opts.iterations, 1)?,
        "super-dispatch" => {
            run_increments(&runtime, my_subclass, "increment", opts.iterations, 2)?
        }
        "ivar" => run_increments(
            &runtime,
            my_class,
            "incrementViaAccessors",
            opts.iterations,
            1,
        )?,
        "forwarding" => run_forwarding(&runtime, my_class, opts.iterations)?,
        "allocation" => run_allocation(&runtime, my_class, opts.iterations)?,
        other => bail!("unknown scenario '{}'", other),
    }

    if opts.verbose {
        println!(
            "{}: {} iterations in {:?}",
            opts.scenario,
            opts.iterations,
            started.elapsed()
        );
    }
    Ok(())
}
