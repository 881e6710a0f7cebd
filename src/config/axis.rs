//! Axis configuration from TOML.

use heapless::String;
use serde::Deserialize;

use crate::error::{ConfigError, Error, Result};

/// Kind of degree of freedom an axis controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    /// Translational axis (stroke, surge, sway).
    Linear,
    /// Rotational axis (twist, roll, pitch).
    Rotation,
    /// Auxiliary channel (valve, suction).
    Auxiliary,
    /// On/off channel (lube).
    Boolean,
}

impl AxisType {
    /// Whether values on this axis are flags rather than positions.
    #[inline]
    pub fn is_boolean(self) -> bool {
        self == AxisType::Boolean
    }

    /// Value an axis of this type starts at when none is configured.
    pub fn default_value(self) -> AxisValue {
        match self {
            AxisType::Boolean => AxisValue::Flag(false),
            AxisType::Auxiliary => AxisValue::Number(0.0),
            AxisType::Linear | AxisType::Rotation => AxisValue::Number(0.5),
        }
    }
}

/// Live or configured value of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    /// Boolean axis state.
    Flag(bool),
    /// Normalized position in [0, 1].
    Number(f64),
}

impl AxisValue {
    /// Get the numeric value, if this is a position.
    #[inline]
    pub fn as_number(self) -> Option<f64> {
        match self {
            AxisValue::Number(v) => Some(v),
            AxisValue::Flag(_) => None,
        }
    }

    /// Get the flag, if this is a boolean state.
    #[inline]
    pub fn as_flag(self) -> Option<bool> {
        match self {
            AxisValue::Flag(b) => Some(b),
            AxisValue::Number(_) => None,
        }
    }

    /// Whether both values are of the same kind.
    #[inline]
    pub fn same_kind(self, other: AxisValue) -> bool {
        matches!(
            (self, other),
            (AxisValue::Flag(_), AxisValue::Flag(_)) | (AxisValue::Number(_), AxisValue::Number(_))
        )
    }
}

impl From<f64> for AxisValue {
    fn from(v: f64) -> Self {
        AxisValue::Number(v)
    }
}

impl From<bool> for AxisValue {
    fn from(b: bool) -> Self {
        AxisValue::Flag(b)
    }
}

/// Complete axis configuration from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AxisConfig {
    /// Machine name, also used as the TCode channel (e.g. `L0`).
    pub name: String<32>,

    /// Axis type.
    #[serde(rename = "type")]
    pub axis_type: AxisType,

    /// Optional alternative name (e.g. `stroke`).
    #[serde(default)]
    pub alias: Option<String<32>>,

    /// Lower end of the output range, in [0, 1].
    #[serde(default = "default_min")]
    pub min: f64,

    /// Upper end of the output range, in [0, 1].
    #[serde(default = "default_max")]
    pub max: f64,

    /// Starting value. Falls back to the type default.
    #[serde(default)]
    pub default_value: Option<AxisValue>,

    /// Return to the default value when the engine is stopped.
    #[serde(default)]
    pub reset_on_stop: bool,
}

fn default_min() -> f64 {
    0.0
}

fn default_max() -> f64 {
    1.0
}

pub(crate) fn identifier(value: &str) -> Result<String<32>> {
    String::try_from(value).map_err(|_| Error::Config(ConfigError::NameTooLong(value.into())))
}

impl AxisConfig {
    /// Create a configuration with the full output range and type defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is longer than 32 bytes.
    pub fn new(name: &str, axis_type: AxisType) -> Result<Self> {
        Ok(Self {
            name: identifier(name)?,
            axis_type,
            alias: None,
            min: default_min(),
            max: default_max(),
            default_value: None,
            reset_on_stop: false,
        })
    }

    /// Set the alias.
    ///
    /// # Errors
    ///
    /// Returns an error if the alias is longer than 32 bytes.
    pub fn with_alias(mut self, alias: &str) -> Result<Self> {
        self.alias = Some(identifier(alias)?);
        Ok(self)
    }

    /// Set the output range.
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the starting value.
    pub fn with_default(mut self, value: impl Into<AxisValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set whether the axis resets when the engine stops.
    pub fn reset_on_stop(mut self, reset: bool) -> Self {
        self.reset_on_stop = reset;
        self
    }

    /// The configured default, or the type default.
    pub fn effective_default(&self) -> AxisValue {
        self.default_value
            .unwrap_or_else(|| self.axis_type.default_value())
    }
}
