//! Movement descriptors and their builder methods.

use crate::motion::{Ramp, ValueFn};

/// Target of a movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Normalized position in [0, 1] for numeric axes.
    Position(f64),
    /// State for boolean axes.
    Flag(bool),
}

impl Target {
    /// Get the position, if this is a numeric target.
    #[inline]
    pub fn position(self) -> Option<f64> {
        match self {
            Target::Position(v) => Some(v),
            Target::Flag(_) => None,
        }
    }
}

impl From<f64> for Target {
    fn from(v: f64) -> Self {
        Target::Position(v)
    }
}

impl From<bool> for Target {
    fn from(b: bool) -> Self {
        Target::Flag(b)
    }
}

/// Caller intent for one axis within one movement batch.
///
/// ```rust,ignore
/// use stroke_engine::Movement;
///
/// let batch = vec![
///     Movement::to(0.0).speed(2.0),
///     Movement::to(0.8).axis("twist").sync("stroke"),
/// ];
/// engine.move_axes(batch).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Movement {
    /// Axis name or alias. The engine default axis when absent.
    pub axis: Option<String>,
    /// Where the axis should end up.
    pub to: Option<Target>,
    /// Custom per-tick value function.
    pub value: Option<ValueFn>,
    /// Ramp override for this movement.
    pub ramp: Option<Ramp>,
    /// Speed in units of the normalized range per second.
    pub speed: Option<f64>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Adopt the resolved duration of another axis in the same batch.
    pub sync: Option<String>,
}

impl Movement {
    /// Create an empty movement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a movement towards a target.
    pub fn to(target: impl Into<Target>) -> Self {
        Self {
            to: Some(target.into()),
            ..Self::default()
        }
    }

    /// Create a movement driven by a value function.
    pub fn with_value(value: ValueFn) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// Set the axis name or alias.
    pub fn axis(mut self, name: &str) -> Self {
        self.axis = Some(name.into());
        self
    }

    /// Set the target.
    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.to = Some(target.into());
        self
    }

    /// Set the value function.
    pub fn value(mut self, value: ValueFn) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the ramp used to reach the target.
    pub fn ramp(mut self, ramp: Ramp) -> Self {
        self.ramp = Some(ramp);
        self
    }

    /// Set the speed.
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Set the duration in seconds.
    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Synchronize with another axis in the same batch.
    pub fn sync(mut self, axis: &str) -> Self {
        self.sync = Some(axis.into());
        self
    }

    /// Whether the movement carries explicit timing.
    #[inline]
    pub fn is_timed(&self) -> bool {
        self.speed.is_some() || self.duration.is_some()
    }
}
