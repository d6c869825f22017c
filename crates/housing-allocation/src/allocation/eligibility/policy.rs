use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{
    ApplicationId, ApplicationStatus, FlatType, ProjectName, RegistrationId,
    RegistrationStatus,
};

/// Outcome of an eligibility rule.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Eligibility {
    Allowed,
    Denied(DenialReason),
}

impl Eligibility {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Eligibility::Allowed)
    }

    pub fn into_result(self) -> Result<(), DenialReason> {
        match self {
            Eligibility::Allowed => Ok(()),
            Eligibility::Denied(reason) => Err(reason),
        }
    }
}

/// Enumerates why a request was refused so callers can explain the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DenialReason {
    SingleUnderAge {
        age: u8,
        minimum: u8,
    },
    SingleRestrictedToSmallest {
        requested: FlatType,
    },
    MarriedUnderAge {
        age: u8,
        minimum: u8,
    },
    HoldsApplication {
        application: ApplicationId,
        status: ApplicationStatus,
    },
    HoldsRegistration {
        registration: RegistrationId,
        status: RegistrationStatus,
    },
    OverlappingAssignment {
        assigned: ProjectName,
        assigned_closes: NaiveDate,
        candidate_opens: NaiveDate,
    },
    RegisteredForProject {
        project: ProjectName,
    },
    AssignedToProject {
        project: ProjectName,
    },
}

impl DenialReason {
    pub fn summary(&self) -> String {
        match self {
            DenialReason::SingleUnderAge { age, minimum } => format!(
                "single applicants must be at least {minimum} years old (applicant is {age})"
            ),
            DenialReason::SingleRestrictedToSmallest { requested } => format!(
                "single applicants may only apply for {} flats (requested {})",
                FlatType::smallest().label(),
                requested.label()
            ),
            DenialReason::MarriedUnderAge { age, minimum } => format!(
                "married applicants must be at least {minimum} years old (applicant is {age})"
            ),
            DenialReason::HoldsApplication {
                application,
                status,
            } => format!("holds application {application} with status {status}"),
            DenialReason::HoldsRegistration {
                registration,
                status,
            } => format!("holds registration {registration} with status {status}"),
            DenialReason::OverlappingAssignment {
                assigned,
                assigned_closes,
                candidate_opens,
            } => format!(
                "assigned to {assigned} until {assigned_closes}, which overlaps a window opening {candidate_opens}"
            ),
            DenialReason::RegisteredForProject { project } => {
                format!("registered to administer {project}")
            }
            DenialReason::AssignedToProject { project } => {
                format!("assigned to administer {project}")
            }
        }
    }
}
