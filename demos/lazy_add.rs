//! Wires up `Value(5) + Value(2)` and reads the sum.
//!
//! Run with `RUST_LOG=debug cargo run --example lazy_add` to watch the nodes
//! compute on demand: nothing happens until the last line asks for the value.

use lazyflow::prelude::*;

fn main() -> Result<(), GraphError> {
    env_logger::init();

    let v1 = new_value_node(5)?;
    let v2 = new_value_node(2)?;
    let add = new_add_node()?;
    add.connect("v1", &v1.output("v")?)?;
    add.connect("v2", &v2.output("v")?)?;

    let report = validate(&add);
    report.log_summary();

    // Everything is lazy so far; this read kicks off the computation.
    println!("{}", add.value("v")?);

    // Served from the cache.
    println!("{}", add.value("v")?);

    Ok(())
}
