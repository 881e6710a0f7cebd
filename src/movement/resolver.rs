//! Movement parameter resolution.
//!
//! Derives speed, duration and step count for every movement in a batch and
//! resolves sync links. Two passes are needed: a sync target, and the
//! implicit batch duration, are only known once every movement's own
//! explicit fields have been resolved.

use libm::{ceil, fabs, round};

use heapless::String;

use crate::axis::{AxisId, AxisRegistry};
use crate::config::{AxisType, AxisValue};
use crate::error::{ConfigError, Error, Result};

use super::validator::{is_timed_kind, ValidatedBatch};
use super::{Movement, Target};

/// Direction of travel on a numeric axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards 1.
    Forward,
    /// Towards 0.
    Reverse,
    /// No travel (flags, value functions without target, zero distance).
    Stationary,
}

impl Direction {
    /// Get direction of travel between two positions.
    #[inline]
    pub fn between(from: f64, to: f64) -> Self {
        if to > from {
            Direction::Forward
        } else if to < from {
            Direction::Reverse
        } else {
            Direction::Stationary
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
            Direction::Stationary => 0.0,
        }
    }
}

/// Movement with every derived parameter filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMovement {
    /// Registry index of the axis.
    pub axis_id: AxisId,
    /// Machine name of the axis.
    pub axis: String<32>,
    /// Axis type.
    pub axis_type: AxisType,
    /// Axis value when the movement started.
    pub from: AxisValue,
    /// Target, if any.
    pub to: Option<Target>,
    /// Speed in normalized units per second.
    pub speed: Option<f64>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Ticks this movement runs for. Zero for step-less movements.
    pub step_count: u32,
    /// Direction of travel.
    pub direction: Direction,
}

impl ResolvedMovement {
    /// Whether the movement runs over ticks.
    #[inline]
    pub fn has_steps(&self) -> bool {
        self.step_count > 0
    }

    /// Distance between start and target on a numeric axis.
    pub fn distance(&self) -> Option<f64> {
        distance(self.from, self.to)
    }
}

fn distance(from: AxisValue, to: Option<Target>) -> Option<f64> {
    match (from, to) {
        (AxisValue::Number(from), Some(Target::Position(to))) => Some(fabs(to - from)),
        _ => None,
    }
}

/// Number of ticks needed to cover `duration` at `frequency`.
///
/// Floating noise below 1e-9 ticks is dropped first, so a duration that is
/// exactly five periods yields five ticks.
pub fn step_count(duration: f64, frequency: f64) -> u32 {
    let ticks = round(duration * frequency * 1e9) / 1e9;
    ceil(ticks).max(0.0) as u32
}

/// Resolve a validated batch against the current axis values.
///
/// # Errors
///
/// Returns an error if an axis vanished from the registry since validation.
pub fn resolve(
    batch: &[Movement],
    validated: &ValidatedBatch,
    registry: &AxisRegistry,
    frequency: f64,
) -> Result<Vec<ResolvedMovement>> {
    let mut resolved = Vec::with_capacity(batch.len());
    let mut max_duration: Option<f64> = None;

    // First pass: each movement's own fields
    for (movement, &id) in batch.iter().zip(validated.axes()) {
        let axis = registry
            .by_id(id)
            .ok_or_else(|| Error::Config(ConfigError::AxisNotFound(format!("#{id}"))))?;

        let from = axis.value();
        let distance = distance(from, movement.to);
        let mut speed = movement.speed;
        let mut duration = movement.duration;

        match (distance, duration, speed) {
            (Some(dist), Some(d), _) => speed = Some(dist / d),
            (Some(dist), None, Some(s)) => duration = Some(dist / s),
            _ => {}
        }

        if let Some(d) = duration {
            max_duration = Some(max_duration.map_or(d, |m: f64| m.max(d)));
        }

        let direction = match (from, movement.to) {
            (AxisValue::Number(from), Some(Target::Position(to))) => Direction::between(from, to),
            _ => Direction::Stationary,
        };

        resolved.push(ResolvedMovement {
            axis_id: id,
            axis: axis.config().name.clone(),
            axis_type: axis.axis_type(),
            from,
            to: movement.to,
            speed,
            duration,
            step_count: 0,
            direction,
        });
    }

    // Second pass: sync links and the implicit batch duration
    for index in 0..resolved.len() {
        let timed = is_timed_kind(&batch[index], resolved[index].axis_type.is_boolean());
        let adopted = if !timed {
            None
        } else if validated.sync_links()[index].is_some() {
            let root = validated.sync_root(index);
            resolved[root].duration.or(max_duration)
        } else if resolved[index].duration.is_none() {
            max_duration
        } else {
            None
        };

        let movement = &mut resolved[index];
        if let Some(d) = adopted {
            movement.duration = Some(d);
            if let Some(dist) = movement.distance() {
                movement.speed = Some(if d > 0.0 { dist / d } else { 0.0 });
            }
        }

        movement.step_count = movement
            .duration
            .map(|d| step_count(d, frequency))
            .unwrap_or(0);
    }

    Ok(resolved)
}
