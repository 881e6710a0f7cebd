//! Movement module for stroke-engine.
//!
//! Describes what callers want an axis to do, checks it against the
//! registry, and resolves the timing every movement runs with.

mod descriptor;
mod resolver;
mod validator;

pub use descriptor::{Movement, Target};
pub use resolver::{resolve, step_count, Direction, ResolvedMovement};
pub use validator::{validate, ValidatedBatch};
