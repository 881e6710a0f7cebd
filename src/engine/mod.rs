//! Motion engine facade.
//!
//! Ties the axis registry, output sinks, admission gate and stepping loop
//! together behind one shared handle.

mod clock;
mod gate;
mod output;

pub use clock::{Clock, TokioClock};
pub use gate::{Admission, ConcurrencyGate, SleepGuard, Ticket};
pub use output::{IoWriter, MemoryWriter, OutputSet, Writer};

pub(crate) use clock::seconds;

use heapless::String;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::axis::{Axis, AxisId, AxisRegistry};
use crate::config::{validate_config, AxisConfig, AxisType, EngineConfig};
use crate::error::{ConfigError, Error, Result, ValidationError};
use crate::motion::{MoveOutcome, PlannedMovement, Ramp, SteppingScheduler, TickSink, ValueProvider};
use crate::movement::{resolve, validate, Movement};
use crate::tcode::{encode_line, encode_value};

/// Speed used by [`MotionEngine::home`].
pub const HOME_SPEED: f64 = 0.5;

/// Drives a set of TCode axes from movement requests.
///
/// Every method takes `&self`; share the engine between tasks with an
/// `Arc`. Requests run one at a time in submission order.
///
/// # Example
///
/// ```rust,ignore
/// use stroke_engine::{EngineConfig, IoWriter, MotionEngine, Movement};
///
/// let engine = MotionEngine::new(EngineConfig::osr2())?;
/// engine.add_output(Box::new(IoWriter::new(serial)));
///
/// engine.move_axes(vec![
///     Movement::to(0.0).speed(2.0),
///     Movement::to(0.3).axis("twist").sync("stroke"),
/// ]).await?;
/// ```
pub struct MotionEngine<C: Clock = TokioClock> {
    registry: Mutex<AxisRegistry>,
    outputs: Mutex<OutputSet>,
    gate: ConcurrencyGate,
    clock: C,
    frequency: f64,
    default_axis: Mutex<String<32>>,
    default_ramp: Mutex<Ramp>,
}

impl MotionEngine<TokioClock> {
    /// Create an engine timed by the tokio clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, TokioClock::new())
    }
}

impl<C: Clock> MotionEngine<C> {
    /// Create an engine timed by the given clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_clock(config: EngineConfig, clock: C) -> Result<Self> {
        validate_config(&config)?;
        let registry = AxisRegistry::from_config(&config)?;
        let default_axis = registry
            .get(&config.default_axis)
            .map(|axis| axis.config().name.clone())
            .ok_or_else(|| Error::Config(ConfigError::AxisNotFound(config.default_axis.as_str().into())))?;

        debug!(axes = registry.len(), frequency = config.frequency, "engine created");
        Ok(Self {
            registry: Mutex::new(registry),
            outputs: Mutex::new(OutputSet::new()),
            gate: ConcurrencyGate::new(),
            clock,
            frequency: config.frequency,
            default_axis: Mutex::new(default_axis),
            default_ramp: Mutex::new(Ramp::default()),
        })
    }

    /// Control loop frequency in ticks per second.
    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// The clock timing this engine.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // =========================================================================
    // Axes
    // =========================================================================

    /// Install a new axis or replace an existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or collides with
    /// another axis.
    pub fn configure_axis(&self, config: AxisConfig) -> Result<()> {
        self.registry.lock().configure(config)
    }

    /// Change the output range of a numeric axis.
    ///
    /// # Errors
    ///
    /// Returns an error for bad bounds, unknown axes and boolean axes.
    pub fn update_limits(&self, axis: &str, lower: f64, upper: f64) -> Result<()> {
        self.registry.lock().update_limits(axis, lower, upper)
    }

    /// Snapshot of an axis by name or alias.
    pub fn axis(&self, name: &str) -> Option<Axis> {
        self.registry.lock().get(name).cloned()
    }

    /// Snapshot of every axis.
    pub fn axes(&self) -> Vec<Axis> {
        self.registry.lock().iter().cloned().collect()
    }

    /// Axis used by movements that do not name one.
    pub fn default_axis(&self) -> String<32> {
        self.default_axis.lock().clone()
    }

    /// Change the default axis.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is unknown.
    pub fn set_default_axis(&self, name: &str) -> Result<()> {
        let canonical = self
            .registry
            .lock()
            .get(name)
            .map(|axis| axis.config().name.clone())
            .ok_or_else(|| Error::Config(ConfigError::AxisNotFound(name.into())))?;
        *self.default_axis.lock() = canonical;
        Ok(())
    }

    /// Change the ramp used by movements that do not pick one.
    pub fn set_default_ramp(&self, ramp: Ramp) {
        *self.default_ramp.lock() = ramp;
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// Register a writer. It receives every line from now on.
    pub fn add_output(&self, writer: Box<dyn Writer>) {
        self.outputs.lock().push(writer);
    }

    /// Remove every writer.
    pub fn clear_outputs(&self) {
        self.outputs.lock().clear();
    }

    /// Number of registered writers.
    pub fn output_count(&self) -> usize {
        self.outputs.lock().len()
    }

    /// Send an arbitrary command line, such as a device query, to every writer.
    pub fn write_raw(&self, line: &str) {
        let mut outputs = self.outputs.lock();
        if line.ends_with('\n') {
            outputs.broadcast(line);
        } else {
            outputs.broadcast(&format!("{line}\n"));
        }
    }

    // =========================================================================
    // Movement
    // =========================================================================

    /// Run a movement batch.
    ///
    /// The batch is validated immediately, then waits for every earlier
    /// request to finish. Starting positions are taken when it is admitted.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the batch is rejected, or a provider
    /// error if a custom value function fails while running. A stopped
    /// request is not an error and returns [`MoveOutcome::Cancelled`].
    pub async fn move_axes(&self, batch: Vec<Movement>) -> Result<MoveOutcome> {
        let default_axis = self.default_axis();
        {
            let registry = self.registry.lock();
            validate(&batch, &registry, &default_axis)?;
        }

        let ticket = self.gate.submit();
        let id = ticket.id();
        debug!(id, movements = batch.len(), "request queued");

        if self.gate.wait_turn(id).await == Admission::Cancelled {
            info!(id, "request cancelled before start");
            return Ok(MoveOutcome::Cancelled);
        }

        let plan = self.plan(&batch, &default_axis)?;
        let mut scheduler = SteppingScheduler::new(self.frequency, &plan);
        let axes: Vec<&str> = plan.iter().map(|p| p.movement.axis.as_str()).collect();
        debug!(id, ?axes, ticks = scheduler.step_count(), "request admitted");

        let sink = TickSink::new(&self.registry, &self.outputs);
        let outcome = scheduler
            .run(&plan, &self.clock, &sink, || self.gate.is_pending(id))
            .await;
        drop(ticket);

        match &outcome {
            Ok(MoveOutcome::Completed) => debug!(id, ticks = scheduler.index(), "request completed"),
            Ok(MoveOutcome::Cancelled) => info!(id, ticks = scheduler.index(), "request cancelled"),
            Err(e) => warn!(id, error = %e, "request failed"),
        }
        outcome
    }

    /// Run a single movement.
    ///
    /// # Errors
    ///
    /// See [`MotionEngine::move_axes`].
    pub async fn move_axis(&self, movement: Movement) -> Result<MoveOutcome> {
        self.move_axes(vec![movement]).await
    }

    /// Move every linear and rotation axis to `value` at [`HOME_SPEED`].
    ///
    /// # Errors
    ///
    /// See [`MotionEngine::move_axes`].
    pub async fn home(&self, value: f64) -> Result<MoveOutcome> {
        let batch: Vec<Movement> = self
            .registry
            .lock()
            .iter()
            .filter(|axis| matches!(axis.axis_type(), AxisType::Linear | AxisType::Rotation))
            .map(|axis| Movement::to(value).axis(axis.name()).speed(HOME_SPEED))
            .collect();
        self.move_axes(batch).await
    }

    /// Wait for `seconds`, unless the engine is stopped first.
    ///
    /// The sleep counts as activity for [`MotionEngine::ready_wait`].
    ///
    /// # Errors
    ///
    /// Returns an error if `seconds` is negative or not finite.
    pub async fn sleep(&self, seconds: f64) -> Result<MoveOutcome> {
        let duration = core::time::Duration::try_from_secs_f64(seconds)
            .map_err(|_| Error::Validation(ValidationError::InvalidSleep(seconds)))?;

        let guard = self.gate.begin_sleep();
        let outcome = tokio::select! {
            () = self.clock.sleep(duration) => MoveOutcome::Completed,
            () = self.gate.wait_cancelled(guard.id()) => MoveOutcome::Cancelled,
        };
        drop(guard);
        Ok(outcome)
    }

    /// Cancel every queued and running request and every sleep, then return
    /// axes flagged `reset_on_stop` to their defaults.
    ///
    /// Running requests stop at their next tick.
    pub fn stop(&self) {
        let cancelled = self.gate.cancel_all();
        info!(cancelled, "engine stopped");

        let mut registry = self.registry.lock();
        let resets: Vec<AxisId> = registry
            .entries()
            .filter(|(_, axis)| axis.reset_on_stop() && axis.value() != axis.default_value())
            .map(|(id, _)| id)
            .collect();

        let tokens = resets
            .iter()
            .filter_map(|id| registry.by_id(*id))
            .map(|axis| encode_value(axis.config(), axis.default_value()));
        if let Some(line) = encode_line(tokens) {
            self.outputs.lock().broadcast(&line);
        }

        for id in resets {
            registry.reset(id);
        }
    }

    /// Wait until nothing is queued, running or sleeping.
    pub async fn ready_wait(&self) {
        self.gate.ready_wait().await;
    }

    /// Check if nothing is queued, running or sleeping.
    pub fn is_idle(&self) -> bool {
        self.gate.is_idle()
    }

    /// Number of queued and running requests.
    pub fn pending(&self) -> usize {
        self.gate.pending_len()
    }

    fn plan(&self, batch: &[Movement], default_axis: &str) -> Result<Vec<PlannedMovement>> {
        let registry = self.registry.lock();
        // Axes may have been reconfigured while the request was queued
        let validated = validate(batch, &registry, default_axis)?;
        let resolved = resolve(batch, &validated, &registry, self.frequency)?;
        let ramp = self.default_ramp.lock();

        Ok(batch
            .iter()
            .zip(resolved)
            .map(|(movement, resolved)| PlannedMovement {
                provider: ValueProvider::build(movement, &resolved, &ramp),
                movement: resolved,
            })
            .collect())
    }
}

impl<C: Clock> core::fmt::Debug for MotionEngine<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotionEngine")
            .field("frequency", &self.frequency)
            .field("axes", &self.registry.lock().len())
            .field("outputs", &self.outputs.lock().len())
            .field("pending", &self.gate.pending_len())
            .finish()
    }
}
