//! Fixed-frequency stepping loop.
//!
//! Runs one admitted batch: evaluates every provider once per tick, writes
//! one combined line and keeps wall time aligned with nominal time by
//! shortening the next wait by the accumulated lateness.

use parking_lot::Mutex;

use crate::axis::{AxisId, AxisRegistry};
use crate::config::AxisValue;
use crate::engine::{seconds, Clock, OutputSet};
use crate::error::{Error, Result};
use crate::movement::ResolvedMovement;
use crate::tcode::{encode_line, encode_value};

use super::provider::{accept, TickContext, ValueProvider};

/// How a movement request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Every tick ran.
    Completed,
    /// The engine was stopped first.
    Cancelled,
}

/// A resolved movement with the provider that drives it.
#[derive(Debug, Clone)]
pub struct PlannedMovement {
    /// Resolved parameters.
    pub movement: ResolvedMovement,
    /// Per-tick value source.
    pub provider: ValueProvider,
}

/// Shared state a tick reads from and writes to.
pub(crate) struct TickSink<'a> {
    registry: &'a Mutex<AxisRegistry>,
    outputs: &'a Mutex<OutputSet>,
}

impl<'a> TickSink<'a> {
    pub(crate) fn new(registry: &'a Mutex<AxisRegistry>, outputs: &'a Mutex<OutputSet>) -> Self {
        Self { registry, outputs }
    }

    /// Current value of every axis, indexed by record.
    fn snapshot(&self) -> Vec<AxisValue> {
        self.registry.lock().iter().map(|axis| axis.value()).collect()
    }

    /// Write changed values as one line and record them.
    ///
    /// Returns the number of axes that changed.
    fn commit(&self, updates: &[(AxisId, AxisValue)]) -> usize {
        let mut registry = self.registry.lock();
        let changed: Vec<(AxisId, AxisValue)> = updates
            .iter()
            .copied()
            .filter(|(id, value)| registry.by_id(*id).is_some_and(|axis| axis.value() != *value))
            .collect();

        let tokens = changed
            .iter()
            .filter_map(|(id, value)| registry.by_id(*id).map(|axis| encode_value(axis.config(), *value)));
        if let Some(line) = encode_line(tokens) {
            self.outputs.lock().broadcast(&line);
        }

        for (id, value) in &changed {
            registry.apply(*id, *value);
        }
        changed.len()
    }
}

/// Tick loop state for one batch.
#[derive(Debug, Clone)]
pub struct SteppingScheduler {
    frequency: f64,
    period: f64,
    index: u32,
    step_count: u32,
    duration: f64,
    timing_error: f64,
}

impl SteppingScheduler {
    /// Prepare a loop for a planned batch.
    pub fn new(frequency: f64, plan: &[PlannedMovement]) -> Self {
        let stepping = plan.iter().map(|p| &p.movement).filter(|m| m.has_steps());
        let step_count = stepping.clone().map(|m| m.step_count).max().unwrap_or(0);
        let duration = stepping.filter_map(|m| m.duration).fold(0.0, f64::max);

        Self {
            frequency,
            period: 1.0 / frequency,
            index: 0,
            step_count,
            duration,
            timing_error: 0.0,
        }
    }

    /// Ticks the batch runs for.
    #[inline]
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Ticks completed so far.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Seconds the loop is running behind nominal time after the last tick.
    #[inline]
    pub fn timing_error(&self) -> f64 {
        self.timing_error
    }

    /// Progress through the batch (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f64 {
        if self.step_count == 0 {
            1.0
        } else {
            self.index as f64 / self.step_count as f64
        }
    }

    /// Run the batch to completion.
    ///
    /// `active` is checked before every tick and once more at the end; when
    /// it turns false the run stops and reports [`MoveOutcome::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] when a custom value function fails. Ticks
    /// written before the failure stay written.
    pub(crate) async fn run<C, F>(
        &mut self,
        plan: &[PlannedMovement],
        clock: &C,
        sink: &TickSink<'_>,
        active: F,
    ) -> Result<MoveOutcome>
    where
        C: Clock,
        F: Fn() -> bool,
    {
        self.apply_stepless(plan, sink)?;

        let start = clock.elapsed();
        let mut expected = 0.0;

        for index in 0..self.step_count {
            if !active() {
                return Ok(MoveOutcome::Cancelled);
            }

            let current = sink.snapshot();
            let mut updates = Vec::with_capacity(plan.len());
            for planned in plan.iter().filter(|p| p.movement.step_count > index) {
                let movement = &planned.movement;
                let ctx = TickContext {
                    index,
                    step_count: movement.step_count,
                    frequency: self.frequency,
                    period: self.period,
                    elapsed: (index + 1) as f64 * self.period,
                    x: (index + 1) as f64 / movement.step_count as f64,
                    current: current.get(movement.axis_id).copied().unwrap_or(movement.from),
                    parameters: movement,
                };
                let sample = planned
                    .provider
                    .evaluate(&ctx)
                    .map_err(|e| Error::provider(&movement.axis, e.to_string()))?;
                if let Some(value) = accept(movement, sample) {
                    updates.push((movement.axis_id, value));
                }
            }
            sink.commit(&updates);

            let wait = if index + 1 == self.step_count {
                let elapsed = clock.elapsed().saturating_sub(start).as_secs_f64();
                (self.duration - elapsed).clamp(0.0, self.period)
            } else {
                (self.period - self.timing_error).max(0.0)
            };
            clock.sleep(seconds(wait)).await;

            expected += self.period;
            self.timing_error = clock.elapsed().saturating_sub(start).as_secs_f64() - expected;
            self.index = index + 1;
        }

        if self.step_count == 0 {
            clock.sleep(seconds(self.period)).await;
        }

        Ok(if active() {
            MoveOutcome::Completed
        } else {
            MoveOutcome::Cancelled
        })
    }

    /// Evaluate step-less movements once, as a single write.
    fn apply_stepless(&self, plan: &[PlannedMovement], sink: &TickSink<'_>) -> Result<()> {
        let stepless: Vec<&PlannedMovement> = plan.iter().filter(|p| !p.movement.has_steps()).collect();
        if stepless.is_empty() {
            return Ok(());
        }

        let current = sink.snapshot();
        let mut updates = Vec::with_capacity(stepless.len());
        for planned in stepless {
            let movement = &planned.movement;
            let ctx = TickContext {
                index: 0,
                step_count: 0,
                frequency: self.frequency,
                period: self.period,
                elapsed: 0.0,
                x: 1.0,
                current: current.get(movement.axis_id).copied().unwrap_or(movement.from),
                parameters: movement,
            };
            let sample = planned
                .provider
                .evaluate(&ctx)
                .map_err(|e| Error::provider(&movement.axis, e.to_string()))?;
            if let Some(value) = accept(movement, sample) {
                updates.push((movement.axis_id, value));
            }
        }
        sink.commit(&updates);
        Ok(())
    }
}
