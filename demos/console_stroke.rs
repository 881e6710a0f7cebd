//! Example: Stroke pattern printed to the console.
//!
//! This example demonstrates how to:
//! - Build an engine from the standard OSR2 layout
//! - Send protocol lines to any byte stream
//! - Run synchronized, ramped and custom movements
//! - Stop a running pattern from another task
//!
//! Run with: `RUST_LOG=stroke_engine=debug cargo run --example console_stroke`

use std::sync::Arc;
use std::time::Duration;

use stroke_engine::{
    EngineConfig, IoWriter, MotionEngine, Movement, Ramp, Result, Sample, ValueFn,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    println!("=== Console Stroke Example ===\n");

    let engine = Arc::new(MotionEngine::new(EngineConfig::osr2())?);
    engine.add_output(Box::new(IoWriter::new(std::io::stdout())));
    engine.set_default_ramp(Ramp::Cosine);

    // 1. Home every linear and rotation axis
    println!("-- home --");
    engine.home(0.5).await?;

    // 2. Stroke down with a twist that finishes at the same time
    println!("-- synced stroke --");
    engine
        .move_axes(vec![
            Movement::to(0.1).speed(2.0),
            Movement::to(0.8).axis("twist").sync("stroke"),
        ])
        .await?;

    // 3. Launch back up on a negative parabola
    println!("-- launch --");
    engine
        .move_axis(Movement::to(0.9).duration(0.3).ramp(Ramp::NegativeParabolic))
        .await?;

    // 4. Lube on, then a wobble driven by a custom function
    println!("-- wobble --");
    engine.move_axis(Movement::to(true).axis("lube")).await?;
    let wobble = ValueFn::new(|ctx| {
        let phase = ctx.elapsed * 4.0 * core::f64::consts::TAU;
        Ok(Sample::Position(0.5 + 0.2 * phase.sin()))
    });
    engine
        .move_axis(Movement::with_value(wobble).axis("roll").duration(1.0))
        .await?;

    // 5. Stop a long movement halfway; lube resets on stop
    println!("-- stop --");
    let slow = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.move_axis(Movement::to(0.0).duration(5.0)).await })
    };
    tokio::time::sleep(Duration::from_millis(400)).await;
    engine.stop();

    match slow.await {
        Ok(outcome) => println!("\nslow stroke: {:?}", outcome?),
        Err(e) => println!("\nslow stroke task failed: {e}"),
    }
    if let Some(axis) = engine.axis("stroke") {
        println!("stroke stopped at {:?}", axis.value());
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
