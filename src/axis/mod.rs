//! Axis module for stroke-engine.
//!
//! Provides the axis registry and immutable axis snapshots.

mod registry;

pub use registry::{AxisId, AxisRegistry, MAX_AXES};

use crate::config::{AxisConfig, AxisType, AxisValue};

/// A configured axis and its live value.
///
/// Values handed out by the engine are snapshots; only the stepping
/// scheduler changes the stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    config: AxisConfig,
    value: AxisValue,
    last_value: AxisValue,
}

impl Axis {
    pub(crate) fn new(config: AxisConfig) -> Self {
        let value = config.effective_default();
        Self {
            config,
            value,
            last_value: value,
        }
    }

    /// Machine name.
    #[inline]
    pub fn name(&self) -> &str {
        self.config.name.as_str()
    }

    /// Alias, if configured.
    #[inline]
    pub fn alias(&self) -> Option<&str> {
        self.config.alias.as_deref()
    }

    /// Axis type.
    #[inline]
    pub fn axis_type(&self) -> AxisType {
        self.config.axis_type
    }

    /// Lower end of the output range.
    #[inline]
    pub fn min(&self) -> f64 {
        self.config.min
    }

    /// Upper end of the output range.
    #[inline]
    pub fn max(&self) -> f64 {
        self.config.max
    }

    /// Value the axis starts at and resets to.
    #[inline]
    pub fn default_value(&self) -> AxisValue {
        self.config.effective_default()
    }

    /// Whether the axis resets when the engine stops.
    #[inline]
    pub fn reset_on_stop(&self) -> bool {
        self.config.reset_on_stop
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> AxisValue {
        self.value
    }

    /// Value before the most recent update.
    #[inline]
    pub fn last_value(&self) -> AxisValue {
        self.last_value
    }

    /// Full configuration.
    #[inline]
    pub fn config(&self) -> &AxisConfig {
        &self.config
    }
}
