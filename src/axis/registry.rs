//! Axis registry for name and alias lookup.

use heapless::{FnvIndexMap, String, Vec};
use tracing::debug;

use crate::config::{validate_axis, validate_limits, AxisConfig, AxisValue, EngineConfig};
use crate::error::{ConfigError, Error, Result};

use super::Axis;

/// Maximum number of axes in the registry.
pub const MAX_AXES: usize = 16;

/// Name and alias keys, two per axis.
const MAX_KEYS: usize = 2 * MAX_AXES;

/// Index of an axis record. Stable for the lifetime of the registry.
pub type AxisId = usize;

/// Registry of configured axes and their live values.
///
/// Every axis is stored once. Its name and its alias are both keys in the
/// lookup table and point at the same record.
#[derive(Debug, Clone)]
pub struct AxisRegistry {
    axes: Vec<Axis, MAX_AXES>,
    lookup: FnvIndexMap<String<32>, AxisId, MAX_KEYS>,
}

impl Default for AxisRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AxisRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            axes: Vec::new(),
            lookup: FnvIndexMap::new(),
        }
    }

    /// Build a registry from every axis in an engine configuration.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error encountered.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut registry = Self::new();
        for axis in config.axes.iter() {
            registry.configure(axis.clone())?;
        }
        Ok(registry)
    }

    /// Install a new axis or replace the configuration of an existing one.
    ///
    /// Replacing an axis keeps its current value when the value kind is
    /// unchanged, and drops its previous alias.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, its name or alias
    /// is taken by another axis, or the registry is full. The registry is
    /// left untouched on error.
    pub fn configure(&mut self, config: AxisConfig) -> Result<()> {
        validate_axis(&config)?;

        let own_id = match self.lookup.get(&config.name).copied() {
            Some(id) if self.axes[id].config.name == config.name => Some(id),
            Some(id) => {
                return Err(Error::Config(ConfigError::NameCollision {
                    name: config.name.as_str().into(),
                    existing: self.axes[id].name().into(),
                }));
            }
            None => None,
        };

        if let Some(alias) = &config.alias {
            if let Some(owner) = self.lookup.get(alias).copied() {
                if Some(owner) != own_id {
                    return Err(Error::Config(ConfigError::AliasCollision {
                        alias: alias.as_str().into(),
                        existing: self.axes[owner].name().into(),
                    }));
                }
            }
        }

        if own_id.is_none() && self.axes.is_full() {
            return Err(Error::Config(ConfigError::RegistryFull(MAX_AXES)));
        }

        let alias = config.alias.clone();
        let id = match own_id {
            Some(id) => {
                let axis = &mut self.axes[id];
                if let Some(old) = axis.config.alias.take() {
                    if old != axis.config.name {
                        self.lookup.remove(&old);
                    }
                }
                let default = config.effective_default();
                if !axis.value.same_kind(default) {
                    axis.value = default;
                    axis.last_value = default;
                }
                axis.config = config;
                id
            }
            None => {
                let name = config.name.clone();
                let id = self.axes.len();
                self.axes
                    .push(Axis::new(config))
                    .map_err(|_| Error::Config(ConfigError::RegistryFull(MAX_AXES)))?;
                self.insert_key(name, id)?;
                id
            }
        };

        if let Some(alias) = alias {
            self.insert_key(alias, id)?;
        }

        debug!(axis = self.axes[id].name(), id, "axis configured");
        Ok(())
    }

    fn insert_key(&mut self, key: String<32>, id: AxisId) -> Result<()> {
        self.lookup
            .insert(key, id)
            .map(|_| ())
            .map_err(|_| Error::Config(ConfigError::RegistryFull(MAX_AXES)))
    }

    /// Get an axis by name or alias.
    pub fn get(&self, name: &str) -> Option<&Axis> {
        self.id_of(name).and_then(|id| self.axes.get(id))
    }

    /// Get the record index of an axis by name or alias.
    pub fn id_of(&self, name: &str) -> Option<AxisId> {
        let key = String::<32>::try_from(name).ok()?;
        self.lookup.get(&key).copied()
    }

    /// Get an axis by record index.
    pub fn by_id(&self, id: AxisId) -> Option<&Axis> {
        self.axes.get(id)
    }

    /// Resolve a name or alias to the machine name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.get(name).map(Axis::name)
    }

    /// Check if a name or alias is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.id_of(name).is_some()
    }

    /// Update the output range of a numeric axis.
    ///
    /// Bounds may be given in either order.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is non-finite or outside [0, 1],
    /// the bounds are equal, or the axis is unknown or boolean.
    pub fn update_limits(&mut self, name: &str, lower: f64, upper: f64) -> Result<()> {
        let (min, max) = if lower <= upper { (lower, upper) } else { (upper, lower) };
        validate_limits(min, max).map_err(|_| {
            Error::Config(ConfigError::InvalidLimits { min: lower, max: upper })
        })?;

        let id = self
            .id_of(name)
            .ok_or_else(|| Error::Config(ConfigError::AxisNotFound(name.into())))?;
        let axis = &mut self.axes[id];
        if axis.axis_type().is_boolean() {
            return Err(Error::Config(ConfigError::BooleanAxis(axis.name().into())));
        }

        axis.config.min = min;
        axis.config.max = max;
        Ok(())
    }

    /// Get the number of registered axes.
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Get an iterator over machine names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(Axis::name)
    }

    /// Get an iterator over axes.
    pub fn iter(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter()
    }

    /// Get an iterator over axes with their record index.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (AxisId, &Axis)> {
        self.axes.iter().enumerate()
    }

    /// Record a new value for an axis, shifting the current one to `last_value`.
    pub(crate) fn apply(&mut self, id: AxisId, value: AxisValue) {
        if let Some(axis) = self.axes.get_mut(id) {
            axis.last_value = axis.value;
            axis.value = value;
        }
    }

    /// Return an axis to its default value.
    pub(crate) fn reset(&mut self, id: AxisId) {
        if let Some(default) = self.axes.get(id).map(Axis::default_value) {
            self.apply(id, default);
        }
    }
}
