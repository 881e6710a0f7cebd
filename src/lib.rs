//! # stroke-engine
//!
//! Multi-axis motion execution for TCode stroker devices.
//!
//! ## Features
//!
//! - **Configuration-driven**: Define axes, aliases and limits in TOML files
//! - **Synchronized batches**: Move several axes at once, sharing one duration
//! - **Pluggable motion**: Built-in ramps, custom per-tick value functions and blends
//! - **Drift-corrected stepping**: Fixed-frequency ticks aligned with wall time
//! - **FIFO requests**: Concurrent callers queue up; `stop` cancels everything
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stroke_engine::{EngineConfig, IoWriter, MotionEngine, Movement};
//!
//! // Standard OSR2 layout, or stroke_engine::load_config("engine.toml")?
//! let engine = MotionEngine::new(EngineConfig::osr2())?;
//! engine.add_output(Box::new(IoWriter::new(std::io::stdout())));
//!
//! // Stroke down while twisting, both finishing together
//! engine.move_axes(vec![
//!     Movement::to(0.0).speed(1.0),
//!     Movement::to(0.8).axis("twist").sync("stroke"),
//! ]).await?;
//!
//! engine.stop();
//! ```
//!
//! ## Feature Flags
//!
//! - `config-file` (default): Enables TOML file loading

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod axis;
pub mod config;
pub mod engine;
pub mod error;
pub mod motion;
pub mod movement;
pub mod tcode;

// Re-exports for ergonomic API
pub use axis::{Axis, AxisRegistry};
pub use config::{validate_config, AxisConfig, AxisType, AxisValue, EngineConfig};
pub use engine::{Clock, IoWriter, MemoryWriter, MotionEngine, TokioClock, Writer};
pub use error::{ConfigError, Error, Result, ValidationError};
pub use motion::{MoveOutcome, Ramp, Sample, TickContext, ValueFn};
pub use movement::{Movement, Target};

// Configuration loading
#[cfg(feature = "config-file")]
pub use config::{load_config, parse_config};
