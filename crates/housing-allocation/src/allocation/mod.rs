//! Housing allocation engine: eligibility-gated applications, officer
//! registrations and flat bookings drawing on one per-project unit ledger.

mod applications;
mod bookings;
pub mod clock;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod ledger;
pub mod projects;
pub mod query;
mod registrations;
pub mod report;
pub mod repository;
mod sequence;
pub mod service;
mod state;
pub mod storage;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    ApplicantProfile, Application, ApplicationId, ApplicationStatus, BookingId, BookingStatus,
    Decision, FlatBooking, FlatType, MaritalStatus, Officer, Project, ProjectName, Registration,
    RegistrationId, RegistrationStatus, UserId,
};
pub use eligibility::{DenialReason, EligibilityPolicy, Eligibility};
pub use error::{AllocationError, ErrorKind, InvariantViolation, RecordKind, ValidationError};
pub use ledger::{FlatOffering, UnitDelta};
pub use projects::{ProjectDraft, ProjectEdit, ProjectFilter};
pub use query::{ApplicationFilter, RegistrationFilter};
pub use report::{BookingReportFilter, BookingReportRow, Receipt};
pub use repository::{RecordStore, RepositoryError, Storage};
pub use service::HousingService;
pub use storage::{CsvStorage, MemoryStorage, MemoryStore};
