//! Configuration validation.

use crate::axis::AxisRegistry;
use crate::error::{ConfigError, Error, Result};

use super::{AxisConfig, AxisValue, EngineConfig};

/// Validate an engine configuration.
///
/// Checks:
/// - Frequency is finite and positive
/// - Every axis configuration is valid
/// - Names and aliases do not collide
/// - The default axis exists
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    if !config.frequency.is_finite() || config.frequency <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidFrequency(config.frequency)));
    }

    // Building a registry runs the per-axis checks and the collision checks
    let registry = AxisRegistry::from_config(config)?;

    if !registry.contains(config.default_axis.as_str()) {
        return Err(Error::Config(ConfigError::AxisNotFound(
            config.default_axis.as_str().into(),
        )));
    }

    Ok(())
}

/// Validate a single axis configuration in isolation.
pub(crate) fn validate_axis(config: &AxisConfig) -> Result<()> {
    let name = config.name.as_str();
    if name.is_empty() {
        return Err(Error::Config(ConfigError::MissingName));
    }

    if let Some(alias) = &config.alias {
        if alias.is_empty() {
            return Err(Error::Config(ConfigError::AliasCollision {
                alias: alias.as_str().into(),
                existing: name.into(),
            }));
        }
    }

    if !config.axis_type.is_boolean() {
        validate_limits(config.min, config.max)?;
    }

    let default_ok = match (config.axis_type.is_boolean(), config.effective_default()) {
        (true, AxisValue::Flag(_)) => true,
        (false, AxisValue::Number(v)) => v.is_finite() && (0.0..=1.0).contains(&v),
        _ => false,
    };
    if !default_ok {
        return Err(Error::Config(ConfigError::InvalidDefaultValue(name.into())));
    }

    Ok(())
}

/// Limits must be finite, inside [0, 1] and strictly ordered.
pub(crate) fn validate_limits(min: f64, max: f64) -> Result<()> {
    let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    if !in_range(min) || !in_range(max) || min >= max {
        return Err(Error::Config(ConfigError::InvalidLimits { min, max }));
    }
    Ok(())
}
