//! Error types for stroke-engine.
//!
//! Provides unified error handling across axis configuration, movement
//! validation and movement execution.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stroke-engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Axis or engine configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Movement batch rejected before execution
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    /// A custom value function failed while its movement was running
    #[error("Value provider for axis '{axis}' failed: {message}")]
    Provider {
        /// Axis whose provider failed
        axis: String,
        /// Failure reported by the provider
        message: String,
    },
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    #[error("Parse error: {0}")]
    ParseError(String),
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(String),
    /// Axis name is empty
    #[error("Axis name must not be empty")]
    MissingName,
    /// Axis name or alias longer than 32 bytes
    #[error("Axis identifier '{0}' is longer than 32 bytes")]
    NameTooLong(String),
    /// Alias collides with the name or alias of another axis
    #[error("Alias '{alias}' already refers to axis '{existing}'")]
    AliasCollision {
        /// The requested alias
        alias: String,
        /// Axis currently owning that identifier
        existing: String,
    },
    /// Name collides with the alias of another axis
    #[error("Name '{name}' is already an alias of axis '{existing}'")]
    NameCollision {
        /// The requested name
        name: String,
        /// Axis owning the alias
        existing: String,
    },
    /// Invalid limits (must be finite, within [0, 1] and min < max)
    #[error("Invalid limits: min ({min}) and max ({max}) must be distinct values in [0, 1] with min < max")]
    InvalidLimits {
        /// Minimum limit value
        min: f64,
        /// Maximum limit value
        max: f64,
    },
    /// Default value does not fit the axis type
    #[error("Invalid default value for axis '{0}'")]
    InvalidDefaultValue(String),
    /// Axis not found in the registry
    #[error("Axis '{0}' not found")]
    AxisNotFound(String),
    /// Operation not supported for boolean axes
    #[error("Axis '{0}' is a boolean axis")]
    BooleanAxis(String),
    /// Registry has no room for another axis
    #[error("Axis registry is full (max {0} axes)")]
    RegistryFull(usize),
    /// Control loop frequency must be finite and positive
    #[error("Invalid frequency: {0}. Must be > 0")]
    InvalidFrequency(f64),
}

/// Movement batch validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Batch contains no movements
    #[error("Movement batch is empty")]
    EmptyBatch,
    /// Axis name or alias does not resolve
    #[error("Movement {index}: unknown axis '{axis}'")]
    UnknownAxis {
        /// Position of the movement in the batch
        index: usize,
        /// Requested axis
        axis: String,
    },
    /// Neither `to` nor `value` was given
    #[error("Movement on '{0}' needs a target or a value function")]
    MissingTarget(String),
    /// `to` does not fit the axis type or range
    #[error("Movement on '{0}' has an invalid target")]
    InvalidTarget(String),
    /// Both `speed` and `duration` were given
    #[error("Movement on '{0}' cannot have both speed and duration")]
    SpeedAndDuration(String),
    /// Speed is not finite or not positive
    #[error("Movement on '{axis}' has invalid speed {speed}")]
    InvalidSpeed {
        /// Axis name
        axis: String,
        /// Offending speed
        speed: f64,
    },
    /// Duration is not finite or not positive
    #[error("Movement on '{axis}' has invalid duration {duration}")]
    InvalidDuration {
        /// Axis name
        axis: String,
        /// Offending duration
        duration: f64,
    },
    /// Speed without a target cannot be resolved
    #[error("Movement on '{0}' has a speed but no target")]
    SpeedWithoutTarget(String),
    /// Ramp and value function are mutually exclusive
    #[error("Movement on '{0}' cannot have both a ramp and a value function")]
    RampAndValue(String),
    /// `sync` together with explicit timing
    #[error("Movement on '{0}' cannot combine sync with speed or duration")]
    SyncWithTiming(String),
    /// `sync` names an axis that is not part of the batch
    #[error("Movement on '{axis}' syncs with '{target}', which is not in the batch")]
    UnknownSyncTarget {
        /// Axis name
        axis: String,
        /// Missing sync target
        target: String,
    },
    /// Sync chain loops back on itself
    #[error("Movement on '{0}' has a sync cycle")]
    SyncCycle(String),
    /// Boolean axes take no speed and no duration with a constant target
    #[error("Boolean axis '{0}' cannot take a speed or a timed constant target")]
    BooleanTiming(String),
    /// Same axis moved twice in one batch
    #[error("Axis '{0}' appears more than once in the batch")]
    DuplicateAxis(String),
    /// No movement supplies a speed or duration
    #[error("At least one movement must have a speed or duration")]
    MissingTiming,
    /// Sleep duration is not finite or negative
    #[error("Invalid sleep duration {0}")]
    InvalidSleep(f64),
}

impl Error {
    /// Create a provider failure for the given axis.
    pub fn provider(axis: &str, message: impl Into<String>) -> Self {
        Error::Provider {
            axis: axis.into(),
            message: message.into(),
        }
    }
}
