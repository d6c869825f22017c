//! Per-project, per-flat-type unit counts.
//!
//! `FlatOffering` keeps its counter private: after a project is created the
//! only runtime path that changes it is [`Transaction::adjust_units`], and the
//! only administrative path is [`Transaction::replace_offerings`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{FlatType, ProjectName};
use super::error::{AllocationError, InvariantViolation, RecordKind, ValidationError};
use super::state::{AllocationState, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatOffering {
    flat_type: FlatType,
    units_available: u32,
    price: u32,
}

impl FlatOffering {
    pub fn new(flat_type: FlatType, units_available: u32, price: u32) -> Self {
        Self {
            flat_type,
            units_available,
            price,
        }
    }

    pub fn flat_type(&self) -> FlatType {
        self.flat_type
    }

    pub fn units_available(&self) -> u32 {
        self.units_available
    }

    pub fn price(&self) -> u32 {
        self.price
    }
}

/// One unit taken by an approved booking, or one unit handed back by an
/// approved withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitDelta {
    Reserve,
    Release,
}

/// Checks the 1-or-2 distinct flat type rule and sorts offerings smallest
/// first.
pub(crate) fn normalize_offerings(
    mut offerings: Vec<FlatOffering>,
) -> Result<Vec<FlatOffering>, ValidationError> {
    if offerings.is_empty() || offerings.len() > FlatType::ordered().len() {
        return Err(ValidationError::InvalidProject(
            "a project offers one or two flat types".to_string(),
        ));
    }
    offerings.sort_by_key(FlatOffering::flat_type);
    if offerings
        .windows(2)
        .any(|pair| pair[0].flat_type == pair[1].flat_type)
    {
        return Err(ValidationError::InvalidProject(
            "flat types must be distinct".to_string(),
        ));
    }
    Ok(offerings)
}

impl AllocationState {
    pub(crate) fn units_available(
        &self,
        project: &ProjectName,
        flat_type: FlatType,
    ) -> Result<u32, AllocationError> {
        let project = self.project(project)?;
        project
            .offering(flat_type)
            .map(FlatOffering::units_available)
            .ok_or_else(|| {
                ValidationError::FlatTypeNotOffered {
                    project: project.name.clone(),
                    flat_type,
                }
                .into()
            })
    }
}

impl Transaction {
    /// Moves one unit in or out of a project's inventory. A reservation that
    /// would take the count below zero is refused and nothing changes.
    pub(crate) fn adjust_units(
        &mut self,
        project: &ProjectName,
        flat_type: FlatType,
        delta: UnitDelta,
    ) -> Result<u32, AllocationError> {
        let project = self.state.project_mut(project)?;
        let name = project.name.clone();
        let offering = project
            .offerings
            .iter_mut()
            .find(|offering| offering.flat_type == flat_type)
            .ok_or_else(|| ValidationError::FlatTypeNotOffered {
                project: name.clone(),
                flat_type,
            })?;

        let remaining = match delta {
            UnitDelta::Reserve => match offering.units_available.checked_sub(1) {
                Some(remaining) => remaining,
                None => {
                    debug!(project = %name, %flat_type, "no units left to reserve");
                    return Err(InvariantViolation::InsufficientUnits {
                        project: name,
                        flat_type,
                    }
                    .into());
                }
            },
            UnitDelta::Release => offering.units_available.saturating_add(1),
        };
        offering.units_available = remaining;
        self.overwritten(RecordKind::Project);

        info!(project = %name, %flat_type, ?delta, remaining, "unit inventory adjusted");
        Ok(remaining)
    }

    /// Administrative replacement of a project's offerings. A flat type that
    /// successful applications depend on cannot be dropped or shrunk below
    /// their number. Pending withdrawals of successful applications still
    /// count. A flat type with bookings cannot be dropped at all.
    pub(crate) fn replace_offerings(
        &mut self,
        project: &ProjectName,
        offerings: Vec<FlatOffering>,
    ) -> Result<(), AllocationError> {
        let offerings = normalize_offerings(offerings)?;
        let current = self.state.project(project)?;
        let name = current.name.clone();

        for flat_type in current.flat_types() {
            if offerings.iter().any(|offering| offering.flat_type == flat_type) {
                continue;
            }
            if self.state.has_bookings(&name, flat_type) {
                debug!(project = %name, %flat_type, "flat type still booked");
                return Err(InvariantViolation::FlatTypeHasBookings {
                    project: name,
                    flat_type,
                }
                .into());
            }
            if self.state.committed_units(&name, flat_type) > 0 {
                return Err(InvariantViolation::FlatTypeHasCommitments {
                    project: name,
                    flat_type,
                }
                .into());
            }
        }

        for offering in &offerings {
            let committed = self.state.committed_units(&name, offering.flat_type);
            if (offering.units_available as usize) < committed {
                return Err(InvariantViolation::UnitsBelowCommitments {
                    project: name,
                    flat_type: offering.flat_type,
                    committed,
                    requested: offering.units_available,
                }
                .into());
            }
        }

        self.state.project_mut(&name)?.offerings = offerings;
        self.overwritten(RecordKind::Project);
        Ok(())
    }
}
