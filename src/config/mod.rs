//! Configuration module for stroke-engine.
//!
//! Provides types for loading and validating axis and engine configurations
//! from TOML files (with the `config-file` feature) or pre-built values.

mod axis;
#[cfg(feature = "config-file")]
mod loader;
mod system;
mod validation;

pub use axis::{AxisConfig, AxisType, AxisValue};
pub use system::{EngineConfig, DEFAULT_FREQUENCY};
pub use validation::validate_config;

pub(crate) use validation::{validate_axis, validate_limits};

#[cfg(feature = "config-file")]
pub use loader::{load_config, parse_config};
