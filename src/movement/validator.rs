//! Movement batch validation.

use crate::axis::{AxisId, AxisRegistry};
use crate::config::AxisType;
use crate::error::{Error, Result, ValidationError};

use super::{Movement, Target};

/// A batch that passed validation, with every axis and sync link resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    axes: Vec<AxisId>,
    sync: Vec<Option<usize>>,
}

impl ValidatedBatch {
    /// Registry index of each movement's axis, in batch order.
    pub fn axes(&self) -> &[AxisId] {
        &self.axes
    }

    /// Batch index each movement syncs with, in batch order.
    pub fn sync_links(&self) -> &[Option<usize>] {
        &self.sync
    }

    /// Follow a sync chain from `index` to the movement it ends at.
    pub fn sync_root(&self, index: usize) -> usize {
        let mut current = index;
        // Chains are acyclic once validated; the bound only guards misuse
        for _ in 0..self.sync.len() {
            match self.sync[current] {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }
}

/// Validate a movement batch against the registry.
///
/// Checks, per movement:
/// - Axis resolves (falling back to `default_axis`)
/// - A target or a value function is present, and the target fits the axis
/// - Speed and duration are exclusive, finite and positive
/// - Speed has a target to be measured against
/// - Ramp and value function are exclusive
/// - Sync carries no timing of its own and names a batch member
/// - Boolean axes take no speed, nor a duration for a constant target
/// - No axis is moved twice
///
/// And across the batch:
/// - Sync chains are acyclic
/// - Timing is given somewhere when any timed movement is present
///
/// # Errors
///
/// Returns the first violation found. Nothing is changed on error.
pub fn validate(
    batch: &[Movement],
    registry: &AxisRegistry,
    default_axis: &str,
) -> Result<ValidatedBatch> {
    if batch.is_empty() {
        return Err(Error::Validation(ValidationError::EmptyBatch));
    }

    let mut axes: Vec<AxisId> = Vec::with_capacity(batch.len());
    let mut names: Vec<&str> = Vec::with_capacity(batch.len());

    for (index, movement) in batch.iter().enumerate() {
        let requested = movement.axis.as_deref().unwrap_or(default_axis);
        let (id, axis) = registry
            .id_of(requested)
            .and_then(|id| registry.by_id(id).map(|axis| (id, axis)))
            .ok_or_else(|| {
                Error::Validation(ValidationError::UnknownAxis {
                    index,
                    axis: requested.into(),
                })
            })?;

        validate_movement(movement, axis.name(), axis.axis_type())?;

        if axes.contains(&id) {
            return Err(Error::Validation(ValidationError::DuplicateAxis(
                axis.name().into(),
            )));
        }
        axes.push(id);
        names.push(axis.name());
    }

    let mut sync = Vec::with_capacity(batch.len());
    for (index, movement) in batch.iter().enumerate() {
        let link = match &movement.sync {
            Some(target) => {
                let peer = registry
                    .id_of(target)
                    .and_then(|id| axes.iter().position(|a| *a == id))
                    .ok_or_else(|| {
                        Error::Validation(ValidationError::UnknownSyncTarget {
                            axis: names[index].into(),
                            target: target.clone(),
                        })
                    })?;
                Some(peer)
            }
            None => None,
        };
        sync.push(link);
    }

    for index in 0..batch.len() {
        let mut visited = vec![index];
        let mut current = index;
        while let Some(next) = sync[current] {
            if visited.contains(&next) {
                return Err(Error::Validation(ValidationError::SyncCycle(
                    names[index].into(),
                )));
            }
            visited.push(next);
            current = next;
        }
    }

    let needs_timing = batch.iter().zip(&axes).any(|(movement, id)| {
        let boolean = registry
            .by_id(*id)
            .map(|axis| axis.axis_type().is_boolean())
            .unwrap_or(false);
        is_timed_kind(movement, boolean)
    });
    if needs_timing && !batch.iter().any(Movement::is_timed) {
        return Err(Error::Validation(ValidationError::MissingTiming));
    }

    Ok(ValidatedBatch { axes, sync })
}

/// Whether a movement plays out over ticks rather than in a single write.
pub(crate) fn is_timed_kind(movement: &Movement, boolean: bool) -> bool {
    !boolean || movement.value.is_some()
}

fn validate_movement(movement: &Movement, name: &str, axis_type: AxisType) -> Result<()> {
    let invalid = |e: ValidationError| Err(Error::Validation(e));
    let boolean = axis_type.is_boolean();

    if movement.to.is_none() && movement.value.is_none() {
        return invalid(ValidationError::MissingTarget(name.into()));
    }

    if let Some(to) = movement.to {
        let fits = match to {
            Target::Flag(_) => boolean,
            Target::Position(v) => !boolean && v.is_finite() && (0.0..=1.0).contains(&v),
        };
        if !fits {
            return invalid(ValidationError::InvalidTarget(name.into()));
        }
    }

    if movement.speed.is_some() && movement.duration.is_some() {
        return invalid(ValidationError::SpeedAndDuration(name.into()));
    }

    if let Some(speed) = movement.speed {
        if !speed.is_finite() || speed <= 0.0 {
            return invalid(ValidationError::InvalidSpeed {
                axis: name.into(),
                speed,
            });
        }
    }

    if let Some(duration) = movement.duration {
        if !duration.is_finite() || duration <= 0.0 {
            return invalid(ValidationError::InvalidDuration {
                axis: name.into(),
                duration,
            });
        }
    }

    if movement.speed.is_some() && movement.to.is_none() {
        return invalid(ValidationError::SpeedWithoutTarget(name.into()));
    }

    if movement.ramp.is_some() && movement.value.is_some() {
        return invalid(ValidationError::RampAndValue(name.into()));
    }

    if movement.sync.is_some() && movement.is_timed() {
        return invalid(ValidationError::SyncWithTiming(name.into()));
    }

    if boolean
        && (movement.speed.is_some()
            || (movement.duration.is_some() && movement.to.is_some() && movement.value.is_none()))
    {
        return invalid(ValidationError::BooleanTiming(name.into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::motion::{Sample, ValueFn};

    fn registry() -> AxisRegistry {
        AxisRegistry::from_config(&EngineConfig::osr2()).unwrap()
    }

    fn check(batch: &[Movement]) -> core::result::Result<ValidatedBatch, ValidationError> {
        validate(batch, &registry(), "L0").map_err(|e| match e {
            Error::Validation(v) => v,
            other => panic!("unexpected error: {other:?}"),
        })
    }

    fn hold() -> ValueFn {
        ValueFn::new(|_| Ok(Sample::Hold))
    }

    #[test]
    fn test_valid_batch_resolves_axes() {
        let batch = [
            Movement::to(0.2).speed(1.0),
            Movement::to(0.7).axis("twist").sync("stroke"),
        ];
        let validated = check(&batch).unwrap();

        let reg = registry();
        assert_eq!(validated.axes(), &[reg.id_of("L0").unwrap(), reg.id_of("R0").unwrap()]);
        assert_eq!(validated.sync_links(), &[None, Some(0)]);
        assert_eq!(validated.sync_root(1), 0);
    }

    #[test]
    fn test_empty_and_unknown() {
        assert_eq!(check(&[]), Err(ValidationError::EmptyBatch));
        assert!(matches!(
            check(&[Movement::to(0.2).axis("Z9").speed(1.0)]),
            Err(ValidationError::UnknownAxis { index: 0, .. })
        ));
    }

    #[test]
    fn test_target_rules() {
        assert!(matches!(
            check(&[Movement::new().axis("L0").speed(1.0)]),
            Err(ValidationError::MissingTarget(_))
        ));
        assert!(matches!(
            check(&[Movement::to(1.2).speed(1.0)]),
            Err(ValidationError::InvalidTarget(_))
        ));
        assert!(matches!(
            check(&[Movement::to(f64::NAN).speed(1.0)]),
            Err(ValidationError::InvalidTarget(_))
        ));
        assert!(matches!(
            check(&[Movement::to(true).speed(1.0)]),
            Err(ValidationError::InvalidTarget(_))
        ));
        assert!(matches!(
            check(&[Movement::to(0.5).axis("lube")]),
            Err(ValidationError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_timing_rules() {
        assert!(matches!(
            check(&[Movement::to(0.2).speed(1.0).duration(1.0)]),
            Err(ValidationError::SpeedAndDuration(_))
        ));
        assert!(matches!(
            check(&[Movement::to(0.2).speed(0.0)]),
            Err(ValidationError::InvalidSpeed { .. })
        ));
        assert!(matches!(
            check(&[Movement::to(0.2).duration(f64::INFINITY)]),
            Err(ValidationError::InvalidDuration { .. })
        ));
        assert!(matches!(
            check(&[Movement::with_value(hold()).speed(1.0)]),
            Err(ValidationError::SpeedWithoutTarget(_))
        ));
        assert!(matches!(
            check(&[Movement::to(0.2)]),
            Err(ValidationError::MissingTiming)
        ));
    }

    #[test]
    fn test_ramp_and_value_exclusive() {
        let movement = Movement::with_value(hold())
            .ramp(crate::motion::Ramp::Cosine)
            .duration(1.0);
        assert!(matches!(
            check(&[movement]),
            Err(ValidationError::RampAndValue(_))
        ));
    }

    #[test]
    fn test_sync_rules() {
        assert!(matches!(
            check(&[
                Movement::to(0.2).speed(1.0),
                Movement::to(0.2).axis("R0").sync("L0").duration(1.0),
            ]),
            Err(ValidationError::SyncWithTiming(_))
        ));
        assert!(matches!(
            check(&[
                Movement::to(0.2).speed(1.0),
                Movement::to(0.2).axis("R0").sync("R1"),
            ]),
            Err(ValidationError::UnknownSyncTarget { .. })
        ));
    }

    #[test]
    fn test_sync_cycles_terminate() {
        // Two-member loop
        assert!(matches!(
            check(&[
                Movement::to(0.2).speed(1.0).axis("L1"),
                Movement::to(0.2).axis("L0").sync("R0"),
                Movement::to(0.2).axis("R0").sync("L0"),
            ]),
            Err(ValidationError::SyncCycle(_))
        ));

        // Self reference
        assert!(matches!(
            check(&[
                Movement::to(0.2).speed(1.0).axis("L1"),
                Movement::to(0.2).axis("L0").sync("stroke"),
            ]),
            Err(ValidationError::SyncCycle(_))
        ));

        // Chain entering a loop that does not contain its origin
        assert!(matches!(
            check(&[
                Movement::to(0.2).axis("L1").sync("L0"),
                Movement::to(0.2).axis("L0").sync("R0"),
                Movement::to(0.2).axis("R0").sync("L0"),
                Movement::to(0.2).axis("R1").speed(1.0),
            ]),
            Err(ValidationError::SyncCycle(_))
        ));
    }

    #[test]
    fn test_boolean_rules() {
        // Plain flips need no timing
        assert!(check(&[Movement::to(true).axis("lube")]).is_ok());

        assert!(matches!(
            check(&[Movement::to(true).axis("lube").duration(1.0)]),
            Err(ValidationError::BooleanTiming(_))
        ));
        assert!(matches!(
            check(&[Movement::with_value(hold()).axis("lube").speed(1.0)]),
            Err(ValidationError::SpeedWithoutTarget(_))
        ));

        // Value driven boolean with a duration is fine
        assert!(check(&[Movement::with_value(hold()).axis("lube").duration(1.0)]).is_ok());
        // ...but needs timing from somewhere
        assert!(matches!(
            check(&[Movement::with_value(hold()).axis("lube")]),
            Err(ValidationError::MissingTiming)
        ));
    }

    #[test]
    fn test_duplicate_axis_by_alias() {
        assert!(matches!(
            check(&[
                Movement::to(0.2).speed(1.0),
                Movement::to(0.3).axis("stroke"),
            ]),
            Err(ValidationError::DuplicateAxis(_))
        ));
    }
}
