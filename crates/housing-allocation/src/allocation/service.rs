use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::clock::Clock;
use super::domain::{
    ApplicantProfile, Application, ApplicationId, BookingId, BookingStatus, Decision, FlatBooking,
    FlatType, Officer, Project, ProjectName, Registration, RegistrationId, UserId,
};
use super::eligibility::EligibilityPolicy;
use super::error::{AllocationError, RecordKind, ValidationError};
use super::projects::{ProjectDraft, ProjectEdit, ProjectFilter};
use super::query::{ApplicationFilter, RegistrationFilter};
use super::report::{BookingReportFilter, BookingReportRow, Receipt};
use super::repository::Storage;
use super::sequence::Sequences;
use super::state::{AllocationState, Context, Transaction};

/// Orchestrates the application, registration and booking lifecycles over a
/// shared inventory ledger.
///
/// Every entry point runs under one lock: checks, mutations and the write
/// through to storage happen on a staged copy that only replaces the live
/// state once storage accepted it. A returned error therefore always leaves
/// both memory and storage as they were.
pub struct HousingService<S> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: EligibilityPolicy,
    sequences: Sequences,
    state: Mutex<AllocationState>,
}

impl<S> HousingService<S>
where
    S: Storage + 'static,
{
    /// Reads every record kind from storage once.
    pub fn load(
        storage: Arc<S>,
        clock: Arc<dyn Clock>,
        policy: EligibilityPolicy,
    ) -> Result<Self, AllocationError> {
        let state = AllocationState::load(storage.as_ref())?;
        let sequences = Sequences::seeded_from(&state);
        info!(
            projects = state.projects.len(),
            applications = state.applications.len(),
            registrations = state.registrations.len(),
            bookings = state.bookings.len(),
            "allocation state loaded"
        );
        Ok(Self {
            storage,
            clock,
            policy,
            sequences,
            state: Mutex::new(state),
        })
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn lock(&self) -> MutexGuard<'_, AllocationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transact<T>(
        &self,
        operation: impl FnOnce(&mut Transaction, Context<'_>) -> Result<T, AllocationError>,
    ) -> Result<T, AllocationError> {
        let mut state = self.lock();
        let ctx = Context {
            policy: &self.policy,
            today: self.clock.today(),
            sequences: &self.sequences,
        };
        let mut transaction = Transaction::begin(&state);
        let outcome = match operation(&mut transaction, ctx) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(error = %err, kind = err.kind().label(), "transition refused");
                return Err(err);
            }
        };
        let committed = transaction.commit(&state, self.storage.as_ref())?;
        *state = committed;
        Ok(outcome)
    }

    fn read<T>(&self, query: impl FnOnce(&AllocationState) -> T) -> T {
        query(&*self.lock())
    }

    // Users.

    pub fn register_applicant(&self, profile: ApplicantProfile) -> Result<ApplicantProfile, AllocationError> {
        self.transact(|tx, _| {
            if tx.state.user_exists(&profile.user_id) {
                return Err(ValidationError::DuplicateUser(profile.user_id.clone()).into());
            }
            tx.state.applicants.push(profile.clone());
            tx.appended(RecordKind::Applicant);
            info!(user = %profile.user_id, "applicant registered");
            Ok(profile)
        })
    }

    pub fn register_officer(&self, profile: ApplicantProfile) -> Result<Officer, AllocationError> {
        self.transact(|tx, _| {
            if tx.state.user_exists(&profile.user_id) {
                return Err(ValidationError::DuplicateUser(profile.user_id.clone()).into());
            }
            let officer = Officer::new(profile);
            tx.state.officers.push(officer.clone());
            tx.appended(RecordKind::Officer);
            info!(user = %officer.user_id(), "officer registered");
            Ok(officer)
        })
    }

    pub fn applicant(&self, user: &UserId) -> Result<ApplicantProfile, AllocationError> {
        self.read(|state| state.applicant_profile(user).cloned())
    }

    pub fn officer(&self, user: &UserId) -> Result<Officer, AllocationError> {
        self.read(|state| {
            state
                .officer(user)
                .cloned()
                .ok_or_else(|| AllocationError::not_found(RecordKind::Officer, user))
        })
    }

    // Projects.

    pub fn create_project(&self, manager: &UserId, draft: ProjectDraft) -> Result<Project, AllocationError> {
        self.transact(|tx, _| tx.create_project(manager, draft))
    }

    pub fn edit_project(
        &self,
        manager: &UserId,
        project: &ProjectName,
        edit: ProjectEdit,
    ) -> Result<Project, AllocationError> {
        self.transact(|tx, _| tx.edit_project(manager, project, edit))
    }

    pub fn set_visibility(
        &self,
        manager: &UserId,
        project: &ProjectName,
        visible: bool,
    ) -> Result<Project, AllocationError> {
        self.transact(|tx, _| tx.set_visibility(manager, project, visible))
    }

    pub fn delete_project(&self, manager: &UserId, project: &ProjectName) -> Result<Project, AllocationError> {
        self.transact(|tx, _| tx.delete_project(manager, project))
    }

    pub fn projects(&self) -> Vec<Project> {
        self.read(|state| state.projects.clone())
    }

    /// Case-insensitive lookup by name.
    pub fn project(&self, name: &ProjectName) -> Result<Project, AllocationError> {
        self.read(|state| state.project(name).cloned())
    }

    pub fn available_projects(
        &self,
        applicant: &UserId,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, AllocationError> {
        let today = self.clock.today();
        self.read(|state| {
            let profile = state.applicant_profile(applicant)?;
            Ok(state.available_projects(profile, filter, &self.policy, today))
        })
    }

    pub fn projects_for_manager(&self, manager: &UserId) -> Vec<Project> {
        self.read(|state| {
            state
                .projects
                .iter()
                .filter(|project| &project.manager == manager)
                .cloned()
                .collect()
        })
    }

    pub fn projects_for_officer(&self, officer: &UserId) -> Vec<Project> {
        self.read(|state| state.projects_for_officer(officer))
    }

    // Applications.

    pub fn create_application(
        &self,
        applicant: &UserId,
        project: &ProjectName,
        flat_type: FlatType,
    ) -> Result<Application, AllocationError> {
        self.transact(|tx, ctx| tx.create_application(ctx, applicant, project, flat_type))
    }

    pub fn request_withdrawal(&self, applicant: &UserId) -> Result<Application, AllocationError> {
        self.transact(|tx, _| tx.request_withdrawal(applicant))
    }

    pub fn decide_application(
        &self,
        manager: &UserId,
        application: &ApplicationId,
        decision: Decision,
    ) -> Result<Application, AllocationError> {
        self.transact(|tx, _| tx.decide_application(manager, application, decision))
    }

    pub fn decide_withdrawal(
        &self,
        manager: &UserId,
        application: &ApplicationId,
        decision: Decision,
    ) -> Result<Application, AllocationError> {
        self.transact(|tx, _| tx.decide_withdrawal(manager, application, decision))
    }

    pub fn application(&self, id: &ApplicationId) -> Result<Application, AllocationError> {
        self.read(|state| state.application(id).cloned())
    }

    /// The application currently attached to an applicant, withdrawn ones
    /// excluded.
    pub fn application_for(&self, applicant: &UserId) -> Option<Application> {
        self.read(|state| state.attached_application(applicant).cloned())
    }

    pub fn applications(&self, filter: &ApplicationFilter) -> Vec<Application> {
        self.read(|state| {
            state
                .applications
                .iter()
                .filter(|application| filter.matches(application))
                .cloned()
                .collect()
        })
    }

    pub fn count_successful(&self, project: &ProjectName, flat_type: FlatType) -> usize {
        self.read(|state| state.count_successful(project, flat_type))
    }

    pub fn units_available(&self, project: &ProjectName, flat_type: FlatType) -> Result<u32, AllocationError> {
        self.read(|state| state.units_available(project, flat_type))
    }

    // Registrations.

    pub fn create_registration(
        &self,
        officer: &UserId,
        project: &ProjectName,
    ) -> Result<Registration, AllocationError> {
        self.transact(|tx, ctx| tx.create_registration(ctx, officer, project))
    }

    pub fn decide_registration(
        &self,
        manager: &UserId,
        registration: &RegistrationId,
        decision: Decision,
    ) -> Result<Registration, AllocationError> {
        self.transact(|tx, _| tx.decide_registration(manager, registration, decision))
    }

    pub fn registration(&self, id: &RegistrationId) -> Result<Registration, AllocationError> {
        self.read(|state| state.registration(id).cloned())
    }

    pub fn registrations(&self, filter: &RegistrationFilter) -> Vec<Registration> {
        self.read(|state| {
            state
                .registrations
                .iter()
                .filter(|registration| filter.matches(registration))
                .cloned()
                .collect()
        })
    }

    /// Frees officers whose assigned project has closed. Returns the
    /// released officers.
    pub fn release_expired_assignments(&self) -> Result<Vec<UserId>, AllocationError> {
        self.transact(|tx, ctx| Ok(tx.release_expired_assignments(ctx.today)))
    }

    // Bookings.

    pub fn create_booking(&self, applicant: &UserId) -> Result<FlatBooking, AllocationError> {
        self.transact(|tx, ctx| tx.create_booking(ctx, applicant))
    }

    pub fn approve_booking(&self, officer: &UserId, booking: &BookingId) -> Result<FlatBooking, AllocationError> {
        self.transact(|tx, ctx| tx.approve_booking(ctx, officer, booking))
    }

    pub fn booking(&self, id: &BookingId) -> Result<FlatBooking, AllocationError> {
        self.read(|state| state.booking(id).cloned())
    }

    pub fn booking_for(&self, applicant: &UserId) -> Option<FlatBooking> {
        self.read(|state| state.booking_for(applicant).cloned())
    }

    pub fn bookings(&self, status: Option<BookingStatus>) -> Vec<FlatBooking> {
        self.read(|state| {
            state
                .bookings
                .iter()
                .filter(|booking| status.map_or(true, |wanted| booking.status == wanted))
                .cloned()
                .collect()
        })
    }

    pub fn booking_report(&self, filter: &BookingReportFilter) -> Vec<BookingReportRow> {
        self.read(|state| state.booking_report(filter))
    }

    pub fn receipt(&self, applicant: &UserId) -> Result<Receipt, AllocationError> {
        self.read(|state| state.receipt(applicant))
    }
}
