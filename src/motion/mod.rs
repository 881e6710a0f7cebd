//! Motion module for stroke-engine.
//!
//! Provides interpolation ramps, per-tick value providers and the stepping
//! loop that turns them into protocol lines.

mod provider;
mod ramp;
mod scheduler;

pub use provider::{ProviderFault, Sample, TickContext, ValueFn, ValueProvider};
pub use ramp::Ramp;
pub use scheduler::{MoveOutcome, PlannedMovement, SteppingScheduler};

pub(crate) use scheduler::TickSink;
