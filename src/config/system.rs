//! Engine configuration - root configuration structure.

use heapless::{String, Vec};
use serde::Deserialize;

use crate::axis::MAX_AXES;

use super::axis::{AxisConfig, AxisType};

/// Default control loop frequency in ticks per second.
pub const DEFAULT_FREQUENCY: f64 = 50.0;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Control loop frequency in ticks per second.
    #[serde(default = "default_frequency")]
    pub frequency: f64,

    /// Axis used by movements that do not name one.
    #[serde(default = "default_axis")]
    pub default_axis: String<32>,

    /// Axis configurations.
    #[serde(default)]
    pub axes: Vec<AxisConfig, MAX_AXES>,
}

fn default_frequency() -> f64 {
    DEFAULT_FREQUENCY
}

fn default_axis() -> String<32> {
    String::try_from("L0").unwrap_or_default()
}

impl EngineConfig {
    /// Create an empty configuration at the default frequency.
    pub fn new() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            default_axis: default_axis(),
            axes: Vec::new(),
        }
    }

    /// Standard six-axis OSR2 layout with its auxiliary channels.
    ///
    /// | Name | Alias   | Type      |
    /// |------|---------|-----------|
    /// | L0   | stroke  | linear    |
    /// | L1   | forward | linear    |
    /// | L2   | left    | linear    |
    /// | R0   | twist   | rotation  |
    /// | R1   | roll    | rotation  |
    /// | R2   | pitch   | rotation  |
    /// | A0   | valve   | auxiliary |
    /// | A1   | suck    | auxiliary |
    /// | A2   | lube    | boolean   |
    pub fn osr2() -> Self {
        let mut config = Self::new();
        for (name, alias, axis_type) in [
            ("L0", "stroke", AxisType::Linear),
            ("L1", "forward", AxisType::Linear),
            ("L2", "left", AxisType::Linear),
            ("R0", "twist", AxisType::Rotation),
            ("R1", "roll", AxisType::Rotation),
            ("R2", "pitch", AxisType::Rotation),
            ("A0", "valve", AxisType::Auxiliary),
            ("A1", "suck", AxisType::Auxiliary),
            ("A2", "lube", AxisType::Boolean),
        ] {
            let axis = AxisConfig {
                name: String::try_from(name).unwrap_or_default(),
                axis_type,
                alias: String::try_from(alias).ok(),
                min: 0.0,
                max: 1.0,
                default_value: None,
                reset_on_stop: axis_type.is_boolean(),
            };
            let _ = config.axes.push(axis);
        }
        config
    }

    /// Get an axis configuration by name or alias.
    pub fn axis(&self, name: &str) -> Option<&AxisConfig> {
        self.axes
            .iter()
            .find(|a| a.name.as_str() == name || a.alias.as_deref() == Some(name))
    }

    /// List all axis names.
    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|a| a.name.as_str())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::osr2()
    }
}
