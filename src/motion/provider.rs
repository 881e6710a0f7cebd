//! Per-tick value providers.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::config::AxisValue;
use crate::movement::{Movement, ResolvedMovement, Target};

use super::Ramp;

/// Failure reported by a custom value function.
pub type ProviderFault = Box<dyn StdError + Send + Sync>;

/// Output of a value provider for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// New position for a numeric axis.
    Position(f64),
    /// New state for a boolean axis.
    Flag(bool),
    /// Leave the axis where it is.
    Hold,
}

impl From<f64> for Sample {
    fn from(v: f64) -> Self {
        Sample::Position(v)
    }
}

impl From<bool> for Sample {
    fn from(b: bool) -> Self {
        Sample::Flag(b)
    }
}

/// Everything a value provider can see on a tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Zero based tick index.
    pub index: u32,
    /// Ticks the movement runs for.
    pub step_count: u32,
    /// Control loop frequency in ticks per second.
    pub frequency: f64,
    /// Seconds per tick.
    pub period: f64,
    /// Nominal seconds at the end of this tick.
    pub elapsed: f64,
    /// Progress through the movement, in (0, 1].
    pub x: f64,
    /// Axis value before this tick.
    pub current: AxisValue,
    /// Resolved movement parameters.
    pub parameters: &'a ResolvedMovement,
}

type ValueFunc = dyn Fn(&TickContext<'_>) -> Result<Sample, ProviderFault> + Send + Sync;

/// Custom value function driving an axis tick by tick.
///
/// ```rust,ignore
/// use stroke_engine::{Movement, Sample, ValueFn};
///
/// let wobble = ValueFn::new(|ctx| {
///     Ok(Sample::Position(0.5 + 0.2 * (ctx.elapsed * 6.0).sin()))
/// });
/// engine.move_axes(vec![Movement::with_value(wobble).duration(2.0)]).await?;
/// ```
#[derive(Clone)]
pub struct ValueFn(Arc<ValueFunc>);

impl ValueFn {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&TickContext<'_>) -> Result<Sample, ProviderFault> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluate the function for a tick.
    #[inline]
    pub fn call(&self, ctx: &TickContext<'_>) -> Result<Sample, ProviderFault> {
        (self.0)(ctx)
    }

    /// Linearly blend the outputs of two value functions.
    ///
    /// A `Hold` on one side yields the other side. Two flags, or samples of
    /// different kinds, select `a` when `factor < 0.5` and `b` otherwise.
    pub fn blend(a: ValueFn, b: ValueFn, factor: f64) -> Self {
        Self::new(move |ctx| {
            let sample = match (a.call(ctx)?, b.call(ctx)?) {
                (Sample::Hold, s) | (s, Sample::Hold) => s,
                (Sample::Position(x), Sample::Position(y)) => Sample::Position(x + (y - x) * factor),
                (x, y) => {
                    if factor < 0.5 {
                        x
                    } else {
                        y
                    }
                }
            };
            Ok(sample)
        })
    }
}

impl fmt::Debug for ValueFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueFn(..)")
    }
}

/// How an axis gets its value on each tick.
#[derive(Debug, Clone)]
pub enum ValueProvider {
    /// Boolean axis switched to a fixed state.
    Constant(bool),
    /// Numeric axis already at its target.
    Noop,
    /// Interpolation between two positions.
    Ramp {
        /// Shape of the interpolation.
        ramp: Ramp,
        /// Start position.
        from: f64,
        /// End position.
        to: f64,
    },
    /// Caller supplied function.
    Custom(ValueFn),
}

impl ValueProvider {
    /// Pick the provider for a resolved movement.
    pub fn build(movement: &Movement, resolved: &ResolvedMovement, default_ramp: &Ramp) -> Self {
        if let Some(value) = &movement.value {
            return ValueProvider::Custom(value.clone());
        }

        match (resolved.from, resolved.to) {
            (_, Some(Target::Flag(b))) => ValueProvider::Constant(b),
            (AxisValue::Number(from), Some(Target::Position(to))) if from != to => {
                ValueProvider::Ramp {
                    ramp: movement.ramp.clone().unwrap_or_else(|| default_ramp.clone()),
                    from,
                    to,
                }
            }
            _ => ValueProvider::Noop,
        }
    }

    /// Produce the sample for a tick.
    ///
    /// # Errors
    ///
    /// Only custom value functions fail.
    pub fn evaluate(&self, ctx: &TickContext<'_>) -> Result<Sample, ProviderFault> {
        match self {
            ValueProvider::Constant(b) => Ok(Sample::Flag(*b)),
            ValueProvider::Noop => Ok(Sample::Hold),
            ValueProvider::Ramp { ramp, from, to } => Ok(Sample::Position(ramp.position(*from, *to, ctx.x))),
            ValueProvider::Custom(f) => f.call(ctx),
        }
    }
}

/// Turn a sample into an axis value, if it is usable.
///
/// Positions are clamped into [0, 1]. Non-finite positions and samples of
/// the wrong kind are skipped with a warning.
pub(crate) fn accept(movement: &ResolvedMovement, sample: Sample) -> Option<AxisValue> {
    let boolean = movement.axis_type.is_boolean();
    match sample {
        Sample::Hold => None,
        Sample::Position(v) if !boolean => {
            if v.is_finite() {
                Some(AxisValue::Number(v.clamp(0.0, 1.0)))
            } else {
                warn!(axis = movement.axis.as_str(), value = v, "skipping non-finite position");
                None
            }
        }
        Sample::Flag(b) if boolean => Some(AxisValue::Flag(b)),
        other => {
            warn!(axis = movement.axis.as_str(), sample = ?other, "skipping sample of the wrong kind");
            None
        }
    }
}
