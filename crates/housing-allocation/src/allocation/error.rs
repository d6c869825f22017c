use std::fmt;

use chrono::NaiveDate;

use super::domain::{
    ApplicationStatus, BookingId, FlatType, ProjectName, RegistrationStatus, UserId,
};
use super::eligibility::DenialReason;
use super::repository::RepositoryError;

/// Record families held by the engine; doubles as the persistence unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    Project,
    Application,
    Registration,
    Booking,
    Applicant,
    Officer,
}

impl RecordKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Application => "application",
            Self::Registration => "registration",
            Self::Booking => "booking",
            Self::Applicant => "applicant",
            Self::Officer => "officer",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse classification callers use to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or a rule refused the request; re-prompt, never retry as is.
    Validation,
    /// Unknown id or name.
    NotFound,
    /// The transition would break an inventory or capacity invariant.
    Invariant,
    /// The persistence collaborator failed; state is unchanged.
    Persistence,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not found",
            Self::Invariant => "invariant",
            Self::Persistence => "persistence",
        }
    }
}

/// Error raised by every engine entry point. A returned error always means
/// the requested transition was not applied.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: RecordKind, id: String },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AllocationError {
    pub fn not_found(kind: RecordKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Invariant(_) => ErrorKind::Invariant,
            Self::Repository(_) => ErrorKind::Persistence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("not eligible: {}", .0.summary())]
    Ineligible(DenialReason),
    #[error("officer registration refused: {}", .0.summary())]
    RegistrationRefused(DenialReason),
    #[error("applications for {project} closed on {closed_on}")]
    ApplicationWindowClosed {
        project: ProjectName,
        closed_on: NaiveDate,
    },
    #[error("project {project} is not open to applicants")]
    ProjectHidden { project: ProjectName },
    #[error("project {project} does not offer {flat_type}")]
    FlatTypeNotOffered {
        project: ProjectName,
        flat_type: FlatType,
    },
    #[error("applicant {applicant} already holds an active application")]
    ActiveApplicationExists { applicant: UserId },
    #[error("{user} is not the manager in charge of {project}")]
    NotManagerInCharge { user: UserId, project: ProjectName },
    #[error("{officer} is not assigned to {project}")]
    NotAssignedOfficer { officer: UserId, project: ProjectName },
    #[error("application status {from} cannot move to {to}")]
    InvalidApplicationTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("registration status {from} cannot move to {to}")]
    InvalidRegistrationTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },
    #[error("withdrawal already requested for {applicant}")]
    WithdrawalAlreadyRequested { applicant: UserId },
    #[error("application must be SUCCESSFUL to book a flat (currently {status})")]
    ApplicationNotSuccessful { status: ApplicationStatus },
    #[error("project {0} already exists")]
    DuplicateProject(ProjectName),
    #[error("user {0} already exists")]
    DuplicateUser(UserId),
    #[error("invalid project: {0}")]
    InvalidProject(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("no remaining {flat_type} units in {project}")]
    InsufficientUnits {
        project: ProjectName,
        flat_type: FlatType,
    },
    #[error("no remaining officer slots in {project}")]
    InsufficientOfficerSlots { project: ProjectName },
    #[error("booking {0} has already been approved")]
    BookingAlreadyApproved(BookingId),
    #[error("applicant {0} has already booked a flat")]
    AlreadyBooked(UserId),
    #[error("{project} has {committed} successful {flat_type} applications; cannot offer {requested} units")]
    UnitsBelowCommitments {
        project: ProjectName,
        flat_type: FlatType,
        committed: usize,
        requested: u32,
    },
    #[error("{project} cannot drop {flat_type} while successful applications depend on it")]
    FlatTypeHasCommitments {
        project: ProjectName,
        flat_type: FlatType,
    },
    #[error("{project} cannot drop {flat_type} while bookings hold it")]
    FlatTypeHasBookings {
        project: ProjectName,
        flat_type: FlatType,
    },
}
