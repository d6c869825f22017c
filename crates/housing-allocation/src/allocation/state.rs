use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use super::domain::{
    ApplicantProfile, Application, FlatBooking, Officer, Project, ProjectName, Registration,
    UserId,
};
use super::eligibility::{EligibilityPolicy, OfficerStanding};
use super::error::{AllocationError, RecordKind};
use super::repository::{RecordStore, RepositoryError, Storage};
use super::sequence::Sequences;

/// Everything the engine knows, loaded once from storage.
#[derive(Debug, Clone, Default)]
pub(crate) struct AllocationState {
    pub(crate) projects: Vec<Project>,
    pub(crate) applications: Vec<Application>,
    pub(crate) registrations: Vec<Registration>,
    pub(crate) bookings: Vec<FlatBooking>,
    pub(crate) applicants: Vec<ApplicantProfile>,
    pub(crate) officers: Vec<Officer>,
}

impl AllocationState {
    pub(crate) fn load<S: Storage + ?Sized>(storage: &S) -> Result<Self, RepositoryError> {
        Ok(Self {
            projects: storage.projects().load_all()?,
            applications: storage.applications().load_all()?,
            registrations: storage.registrations().load_all()?,
            bookings: storage.bookings().load_all()?,
            applicants: storage.applicants().load_all()?,
            officers: storage.officers().load_all()?,
        })
    }

    pub(crate) fn find_project(&self, name: &ProjectName) -> Option<&Project> {
        self.projects.iter().find(|project| &project.name == name)
    }

    pub(crate) fn project(&self, name: &ProjectName) -> Result<&Project, AllocationError> {
        self.find_project(name)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Project, name))
    }

    pub(crate) fn project_mut(&mut self, name: &ProjectName) -> Result<&mut Project, AllocationError> {
        self.projects
            .iter_mut()
            .find(|project| &project.name == name)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Project, name))
    }

    pub(crate) fn officer(&self, user: &UserId) -> Option<&Officer> {
        self.officers.iter().find(|officer| officer.user_id() == user)
    }

    pub(crate) fn officer_mut(&mut self, user: &UserId) -> Option<&mut Officer> {
        self.officers
            .iter_mut()
            .find(|officer| officer.user_id() == user)
    }

    /// Applicant capability of a user, whether a plain applicant or an officer.
    pub(crate) fn applicant_profile(&self, user: &UserId) -> Result<&ApplicantProfile, AllocationError> {
        self.applicants
            .iter()
            .find(|profile| &profile.user_id == user)
            .or_else(|| self.officer(user).map(|officer| &officer.profile))
            .ok_or_else(|| AllocationError::not_found(RecordKind::Applicant, user))
    }

    pub(crate) fn user_exists(&self, user: &UserId) -> bool {
        self.applicant_profile(user).is_ok()
    }

    pub(crate) fn officer_standing(&self, officer: &Officer) -> OfficerStanding<'_> {
        OfficerStanding {
            application: self.attached_application(officer.user_id()),
            registration: self.current_registration(officer),
            assigned_project: officer
                .assigned_project
                .as_ref()
                .and_then(|name| self.find_project(name)),
        }
    }
}

/// Inputs every lifecycle operation reads besides the state itself.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub(crate) policy: &'a EligibilityPolicy,
    pub(crate) today: NaiveDate,
    pub(crate) sequences: &'a Sequences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// The last `n` records of the kind are new.
    Append(usize),
    Overwrite,
}

/// A staged copy of the state plus the record kinds that must be written
/// before the copy may replace the live state.
#[derive(Debug)]
pub(crate) struct Transaction {
    pub(crate) state: AllocationState,
    writes: BTreeMap<RecordKind, WriteMode>,
}

impl Transaction {
    pub(crate) fn begin(state: &AllocationState) -> Self {
        Self {
            state: state.clone(),
            writes: BTreeMap::new(),
        }
    }

    pub(crate) fn appended(&mut self, kind: RecordKind) {
        let mode = self.writes.entry(kind).or_insert(WriteMode::Append(0));
        if let WriteMode::Append(count) = mode {
            *count += 1;
        }
    }

    pub(crate) fn overwritten(&mut self, kind: RecordKind) {
        self.writes.insert(kind, WriteMode::Overwrite);
    }

    /// Writes every touched kind. When a write fails, the kinds already
    /// written are restored from `previous` and the staged state is dropped.
    pub(crate) fn commit<S: Storage + ?Sized>(
        self,
        previous: &AllocationState,
        storage: &S,
    ) -> Result<AllocationState, RepositoryError> {
        let mut written = Vec::new();
        for (&kind, &mode) in &self.writes {
            if let Err(error) = write_kind(storage, &self.state, kind, mode) {
                // A failed append may have landed some of its rows.
                if matches!(mode, WriteMode::Append(_)) {
                    written.push(kind);
                }
                for done in written {
                    if let Err(restore) = write_kind(storage, previous, done, WriteMode::Overwrite) {
                        warn!(kind = %done, error = %restore, "failed to restore records after aborted write");
                    }
                }
                return Err(error);
            }
            written.push(kind);
        }
        Ok(self.state)
    }
}

fn write_kind<S: Storage + ?Sized>(
    storage: &S,
    state: &AllocationState,
    kind: RecordKind,
    mode: WriteMode,
) -> Result<(), RepositoryError> {
    match kind {
        RecordKind::Project => write_records(storage.projects(), &state.projects, mode),
        RecordKind::Application => write_records(storage.applications(), &state.applications, mode),
        RecordKind::Registration => {
            write_records(storage.registrations(), &state.registrations, mode)
        }
        RecordKind::Booking => write_records(storage.bookings(), &state.bookings, mode),
        RecordKind::Applicant => write_records(storage.applicants(), &state.applicants, mode),
        RecordKind::Officer => write_records(storage.officers(), &state.officers, mode),
    }
}

fn write_records<T>(
    store: &dyn RecordStore<T>,
    records: &[T],
    mode: WriteMode,
) -> Result<(), RepositoryError> {
    match mode {
        WriteMode::Overwrite => store.overwrite_all(records),
        WriteMode::Append(count) => {
            let start = records.len().saturating_sub(count);
            records[start..]
                .iter()
                .try_for_each(|record| store.append(record))
        }
    }
}
