//! Integration tests for stroke-engine.
//!
//! These tests drive the complete workflow from configuration to the
//! protocol lines written to an output, on tokio's paused clock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use proptest::prelude::*;

use stroke_engine::config::{parse_config, AxisConfig, AxisType, AxisValue, EngineConfig};
use stroke_engine::engine::{Clock, MemoryWriter, MotionEngine};
use stroke_engine::error::{ConfigError, Error, ValidationError};
use stroke_engine::motion::{MoveOutcome, Ramp, Sample, ValueFn};
use stroke_engine::movement::Movement;
use stroke_engine::tcode::{parse_token, value_code};

// =============================================================================
// Test configuration data
// =============================================================================

const DEVICE_CONFIG: &str = r#"
frequency = 50.0
default_axis = "stroke"

[[axes]]
name = "L0"
type = "linear"
alias = "stroke"

[[axes]]
name = "R0"
type = "rotation"
alias = "twist"
min = 0.25
max = 0.75

[[axes]]
name = "V0"
type = "auxiliary"
alias = "vibe"
default_value = 0.0
reset_on_stop = true

[[axes]]
name = "A2"
type = "boolean"
alias = "lube"
reset_on_stop = true
"#;

fn osr2() -> (Arc<MotionEngine>, MemoryWriter) {
    let engine = Arc::new(MotionEngine::new(EngineConfig::osr2()).expect("OSR2 layout is valid"));
    let lines = MemoryWriter::new();
    engine.add_output(Box::new(lines.clone()));
    (engine, lines)
}

async fn wait_pending(engine: &MotionEngine, count: usize) {
    while engine.pending() < count {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Configuration workflow
// =============================================================================

#[tokio::test(start_paused = true)]
async fn config_to_engine_workflow() {
    // Step 1: Parse configuration
    let config = parse_config(DEVICE_CONFIG).expect("Config should parse");
    assert_eq!(config.axes.len(), 4);

    // Step 2: Build the engine and attach an output
    let engine = MotionEngine::new(config).expect("Engine should build");
    let lines = MemoryWriter::new();
    engine.add_output(Box::new(lines.clone()));
    assert_eq!(engine.default_axis().as_str(), "L0");

    // Step 3: Limits scale the emitted codes, not the stored value
    engine
        .move_axis(Movement::to(1.0).axis("twist").duration(0.04))
        .await
        .unwrap();
    assert_eq!(lines.lines(), vec!["R06249\n", "R07499\n"]);
    assert_eq!(engine.axis("R0").unwrap().value(), AxisValue::Number(1.0));

    // Step 4: Configured defaults are where axes start
    assert_eq!(engine.axis("vibe").unwrap().value(), AxisValue::Number(0.0));
}

#[test]
fn runtime_axis_configuration() {
    let engine = MotionEngine::new(EngineConfig::osr2()).unwrap();

    let vibe = AxisConfig::new("V0", AxisType::Auxiliary)
        .unwrap()
        .with_alias("vibe")
        .unwrap()
        .with_default(0.0);
    engine.configure_axis(vibe).unwrap();
    assert_eq!(engine.axes().len(), 10);

    let taken = AxisConfig::new("V1", AxisType::Auxiliary)
        .unwrap()
        .with_alias("stroke")
        .unwrap();
    assert!(matches!(
        engine.configure_axis(taken),
        Err(Error::Config(ConfigError::AliasCollision { .. }))
    ));

    engine.update_limits("vibe", 0.9, 0.1).unwrap();
    let axis = engine.axis("V0").unwrap();
    assert!((axis.min() - 0.1).abs() < f64::EPSILON);
    assert!(matches!(
        engine.update_limits("lube", 0.0, 1.0),
        Err(Error::Config(ConfigError::BooleanAxis(_)))
    ));
}

// =============================================================================
// Stepping
// =============================================================================

#[tokio::test(start_paused = true)]
async fn twist_ramp_emits_expected_lines() {
    let (engine, lines) = osr2();

    let outcome = engine
        .move_axis(Movement::to(0.4).axis("R0").speed(1.0))
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::Completed);
    assert_eq!(
        lines.lines(),
        vec!["R04800\n", "R04600\n", "R04400\n", "R04200\n", "R04000\n"]
    );
    assert_eq!(engine.axis("twist").unwrap().value(), AxisValue::Number(0.4));
    let twist = engine.axis("twist").unwrap();
    assert_eq!(value_code(twist.config(), twist.last_value()), 4200);
}

#[tokio::test(start_paused = true)]
async fn sync_chain_shares_duration() {
    let (engine, lines) = osr2();
    let start = engine.clock().elapsed();

    engine
        .move_axes(vec![
            Movement::to(0.0).axis("L1").sync("R0"),
            Movement::to(0.9).axis("R0").sync("L0"),
            Movement::to(0.0).duration(0.5),
        ])
        .await
        .unwrap();

    let lines = lines.lines();
    assert_eq!(lines.len(), 25);
    assert_eq!(lines.last().unwrap(), "L10000 R08999 L00000\n");
    let elapsed = engine.clock().elapsed() - start;
    assert!((elapsed.as_secs_f64() - 0.5).abs() < 0.01, "took {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn synced_lube_flip_is_written_once_up_front() {
    let (engine, lines) = osr2();

    engine
        .move_axes(vec![
            Movement::to(0.4).speed(1.0),
            Movement::to(true).axis("lube").sync("stroke"),
        ])
        .await
        .unwrap();

    let lines = lines.lines();
    assert_eq!(lines[0], "A29999\n");
    assert_eq!(lines[1..], ["L04800\n", "L04600\n", "L04400\n", "L04200\n", "L04000\n"]);
}

#[tokio::test(start_paused = true)]
async fn sync_cycle_is_rejected_without_effects() {
    let (engine, lines) = osr2();

    let result = engine
        .move_axes(vec![
            Movement::to(0.2).axis("L1").speed(1.0),
            Movement::to(0.2).axis("L0").sync("R0"),
            Movement::to(0.2).axis("R0").sync("L0"),
        ])
        .await;

    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::SyncCycle(_)))
    ));
    assert!(lines.lines().is_empty());
    assert!(engine.is_idle());
    assert_eq!(engine.axis("L1").unwrap().value(), AxisValue::Number(0.5));
}

#[tokio::test(start_paused = true)]
async fn moves_to_current_value_write_nothing() {
    let (engine, lines) = osr2();

    engine.move_axis(Movement::to(0.5).speed(1.0)).await.unwrap();
    assert!(lines.lines().is_empty());

    engine.move_axis(Movement::to(0.2).speed(2.0)).await.unwrap();
    let written = lines.lines().len();
    let before = engine.axis("L0").unwrap().last_value();
    engine.move_axis(Movement::to(0.2).speed(2.0)).await.unwrap();
    assert_eq!(lines.lines().len(), written);
    assert_eq!(engine.axis("L0").unwrap().last_value(), before);
}

#[tokio::test(start_paused = true)]
async fn shorter_movements_finish_early() {
    let (engine, lines) = osr2();

    engine
        .move_axes(vec![
            Movement::to(0.4).speed(1.0),
            Movement::to(0.3).axis("R0").duration(0.2),
        ])
        .await
        .unwrap();

    let lines = lines.lines();
    assert_eq!(lines.len(), 10);
    assert!(lines[4].starts_with("L04000 "));
    assert!(lines[5..].iter().all(|line| line.starts_with("R0")));
    assert_eq!(lines[9], "R03000\n");
}

#[tokio::test(start_paused = true)]
async fn synced_custom_provider_sees_constant_speed() {
    let (engine, _lines) = osr2();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let recorder = {
        let seen = Arc::clone(&seen);
        ValueFn::new(move |ctx| {
            seen.lock().push((ctx.parameters.speed, ctx.x));
            Ok(Sample::Hold)
        })
    };
    engine
        .move_axes(vec![
            Movement::to(0.0).duration(0.5),
            Movement::with_value(recorder).target(1.0).axis("twist").sync("stroke"),
        ])
        .await
        .unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 25);
    for (speed, _) in seen.iter() {
        assert!((speed.unwrap() - 1.0).abs() < 1e-12);
    }
    assert!((seen.last().unwrap().1 - 1.0).abs() < 1e-12);
    // Hold leaves the axis untouched
    assert_eq!(engine.axis("R0").unwrap().value(), AxisValue::Number(0.5));
}

#[tokio::test(start_paused = true)]
async fn default_ramp_applies_to_unramped_movements() {
    let (engine, lines) = osr2();
    engine.set_default_ramp(Ramp::Cosine);

    engine.move_axis(Movement::to(0.0).duration(0.1)).await.unwrap();
    engine
        .move_axis(Movement::to(1.0).duration(0.04).ramp(Ramp::Linear))
        .await
        .unwrap();

    let lines = lines.lines();
    // cos easing: first step covers (1 - cos(pi/5)) / 2 of the distance
    assert_eq!(lines[0], "L04522\n");
    assert_eq!(lines[4], "L00000\n");
    assert_eq!(&lines[5..], ["L05000\n", "L09999\n"]);
}

// =============================================================================
// Faults
// =============================================================================

#[tokio::test(start_paused = true)]
async fn provider_fault_aborts_and_frees_the_queue() {
    let (engine, lines) = osr2();
    let failing = ValueFn::new(|ctx| {
        if ctx.index == 3 {
            Err("encoder fault".into())
        } else {
            Ok(Sample::Position(ctx.x))
        }
    });

    let result = engine
        .move_axis(Movement::with_value(failing).duration(1.0))
        .await;

    assert_eq!(result, Err(Error::provider("L0", "encoder fault")));
    assert_eq!(lines.lines().len(), 3);
    assert!(engine.is_idle());

    // The next request runs normally
    engine.move_axis(Movement::to(0.0).speed(5.0)).await.unwrap();
    assert_eq!(lines.lines().last().unwrap(), "L00000\n");
}

#[tokio::test(start_paused = true)]
async fn bad_samples_are_skipped() {
    let (engine, lines) = osr2();
    let noisy = ValueFn::new(|ctx| {
        Ok(match ctx.index {
            0 => Sample::Position(f64::NAN),
            1 => Sample::Flag(true),
            2 => Sample::Position(7.0),
            _ => Sample::Hold,
        })
    });

    engine
        .move_axis(Movement::with_value(noisy).duration(0.1))
        .await
        .unwrap();

    assert_eq!(lines.lines(), vec!["L09999\n"]);
    assert_eq!(engine.axis("L0").unwrap().value(), AxisValue::Number(1.0));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(start_paused = true)]
async fn requests_run_in_submission_order() {
    let (engine, lines) = osr2();

    let first = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.move_axis(Movement::to(0.0).duration(0.1)).await })
    };
    wait_pending(&engine, 1).await;
    let second = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .move_axis(Movement::to(1.0).axis("R0").duration(0.1))
                .await
        })
    };
    wait_pending(&engine, 2).await;

    assert_eq!(first.await.unwrap().unwrap(), MoveOutcome::Completed);
    assert_eq!(second.await.unwrap().unwrap(), MoveOutcome::Completed);

    let lines = lines.lines();
    assert_eq!(lines.len(), 10);
    assert!(lines[..5].iter().all(|line| line.starts_with("L0")));
    assert!(lines[5..].iter().all(|line| line.starts_with("R0")));
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_every_pending_request() {
    const QUEUED: usize = 4;
    let (engine, lines) = osr2();
    engine.move_axis(Movement::to(true).axis("lube")).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..=QUEUED {
        let task_engine = Arc::clone(&engine);
        let target = 0.1 * i as f64;
        handles.push(tokio::spawn(async move {
            task_engine.move_axis(Movement::to(target).duration(10.0)).await
        }));
        wait_pending(&engine, i + 1).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    engine.stop();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), MoveOutcome::Cancelled);
    }
    engine.ready_wait().await;
    assert!(engine.is_idle());

    let lines = lines.lines();
    assert_eq!(lines.last().unwrap(), "A20000\n");
    assert_eq!(engine.axis("lube").unwrap().value(), AxisValue::Flag(false));
    // Only the running request got to write, and only until the stop
    assert!(lines.len() < 20);
}

#[tokio::test(start_paused = true)]
async fn home_then_ready_wait() {
    let (engine, _lines) = osr2();

    let homing = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.home(0.2).await })
    };
    wait_pending(&engine, 1).await;

    engine.ready_wait().await;
    assert_eq!(homing.await.unwrap().unwrap(), MoveOutcome::Completed);
    for name in ["L0", "L1", "L2", "R0", "R1", "R2"] {
        assert_eq!(engine.axis(name).unwrap().value(), AxisValue::Number(0.2));
    }
    assert_eq!(engine.axis("A0").unwrap().value(), AxisValue::Number(0.0));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_tick_is_written_and_target_reached(to in 0.0f64..=1.0, speed in 0.2f64..4.0) {
        let distance = (to - 0.5).abs();
        prop_assume!(distance > 1e-6);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let (engine, lines) = runtime.block_on(async {
            let (engine, lines) = osr2();
            engine.move_axis(Movement::to(to).speed(speed)).await.unwrap();
            (engine, lines)
        });

        let expected_ticks = (distance / speed * 50.0 * 1e9).round() / 1e9;
        let lines = lines.lines();
        prop_assert_eq!(lines.len() as f64, expected_ticks.ceil());

        let axis = engine.axis("L0").unwrap();
        let (code, digits) = parse_token(lines.last().unwrap().trim_end()).unwrap();
        prop_assert_eq!(code, "L0");
        prop_assert_eq!(digits, value_code(axis.config(), AxisValue::Number(to)));
    }
}
