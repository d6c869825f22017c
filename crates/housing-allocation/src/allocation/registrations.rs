use chrono::NaiveDate;
use tracing::{debug, info};

use super::domain::{
    Decision, Officer, ProjectName, Registration, RegistrationId, RegistrationStatus, UserId,
};
use super::eligibility::{can_register_as_officer, DenialReason};
use super::error::{AllocationError, InvariantViolation, RecordKind, ValidationError};
use super::projects::ensure_manager;
use super::state::{AllocationState, Context, Transaction};

impl AllocationState {
    pub(crate) fn registration(&self, id: &RegistrationId) -> Result<&Registration, AllocationError> {
        self.registrations
            .iter()
            .find(|registration| &registration.id == id)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Registration, id))
    }

    /// The registration the officer currently references, if it still exists.
    pub(crate) fn current_registration(&self, officer: &Officer) -> Option<&Registration> {
        let id = officer.registration.as_ref()?;
        self.registrations
            .iter()
            .find(|registration| &registration.id == id)
    }

    fn assignment_expired(&self, officer: &Officer, today: NaiveDate) -> bool {
        match &officer.assigned_project {
            Some(name) => self
                .find_project(name)
                .map_or(true, |project| project.window_closed(today)),
            None => officer.registration.is_some() && self.current_registration(officer).is_none(),
        }
    }
}

impl Transaction {
    /// Clears the assignment and registration reference of an officer whose
    /// project has closed or disappeared. Returns whether anything changed.
    pub(crate) fn release_expired_assignment(&mut self, user: &UserId, today: NaiveDate) -> bool {
        let expired = self
            .state
            .officer(user)
            .is_some_and(|officer| self.state.assignment_expired(officer, today));
        if !expired {
            return false;
        }

        let Some(officer) = self.state.officer_mut(user) else {
            return false;
        };
        let released = officer.assigned_project.take();
        officer.registration = None;
        self.overwritten(RecordKind::Officer);

        info!(officer = %user, project = ?released.map(|name| name.to_string()), "officer assignment released");
        true
    }

    pub(crate) fn release_expired_assignments(&mut self, today: NaiveDate) -> Vec<UserId> {
        let officers: Vec<UserId> = self
            .state
            .officers
            .iter()
            .map(|officer| officer.user_id().clone())
            .collect();
        officers
            .into_iter()
            .filter(|user| self.release_expired_assignment(user, today))
            .collect()
    }

    pub(crate) fn create_registration(
        &mut self,
        ctx: Context<'_>,
        user: &UserId,
        project: &ProjectName,
    ) -> Result<Registration, AllocationError> {
        self.release_expired_assignment(user, ctx.today);

        let state = &self.state;
        let officer = state
            .officer(user)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Officer, user))?;
        let project = state.project(project)?;

        if let Err(reason) =
            can_register_as_officer(&state.officer_standing(officer), project, ctx.today)
                .into_result()
        {
            debug!(officer = %user, project = %project.name, reason = %reason.summary(), "registration refused");
            return Err(ValidationError::RegistrationRefused(reason).into());
        }

        let registration = Registration {
            id: ctx.sequences.registration_id(&project.name),
            officer: user.clone(),
            project: project.name.clone(),
            status: RegistrationStatus::Pending,
            submitted_on: ctx.today,
        };
        self.state.registrations.push(registration.clone());
        self.appended(RecordKind::Registration);

        if let Some(officer) = self.state.officer_mut(user) {
            officer.registration = Some(registration.id.clone());
        }
        self.overwritten(RecordKind::Officer);

        info!(
            registration_id = %registration.id,
            officer = %user,
            project = %registration.project,
            "officer registration submitted"
        );
        Ok(registration)
    }

    /// Approval consumes one officer slot and assigns the officer to the
    /// project; it is refused when no slots remain.
    pub(crate) fn decide_registration(
        &mut self,
        manager: &UserId,
        id: &RegistrationId,
        decision: Decision,
    ) -> Result<Registration, AllocationError> {
        let registration = self.state.registration(id)?;
        let project = self.state.project(&registration.project)?;
        ensure_manager(project, manager)?;

        let target = match decision {
            Decision::Approve => RegistrationStatus::Approved,
            Decision::Reject => RegistrationStatus::Rejected,
        };
        if registration.status != RegistrationStatus::Pending {
            return Err(ValidationError::InvalidRegistrationTransition {
                from: registration.status,
                to: target,
            }
            .into());
        }

        let officer_id = registration.officer.clone();
        let project_name = project.name.clone();

        if decision == Decision::Approve {
            // An application filed while the registration was pending still
            // disqualifies the officer.
            if let Some(application) = self.state.active_application(&officer_id) {
                debug!(
                    registration_id = %id,
                    officer = %officer_id,
                    application_id = %application.id,
                    "officer holds an application"
                );
                return Err(ValidationError::RegistrationRefused(DenialReason::HoldsApplication {
                    application: application.id.clone(),
                    status: application.status,
                })
                .into());
            }

            let project = self.state.project_mut(&project_name)?;
            if project.officer_slots == 0 {
                debug!(registration_id = %id, project = %project_name, "no officer slots left");
                return Err(InvariantViolation::InsufficientOfficerSlots {
                    project: project_name,
                }
                .into());
            }
            project.officer_slots -= 1;
            if !project.has_officer(&officer_id) {
                project.assigned_officers.push(officer_id.clone());
            }
            self.overwritten(RecordKind::Project);

            let officer = self
                .state
                .officer_mut(&officer_id)
                .ok_or_else(|| AllocationError::not_found(RecordKind::Officer, &officer_id))?;
            officer.assigned_project = Some(project_name.clone());
            self.overwritten(RecordKind::Officer);
        }

        let registration = self
            .state
            .registrations
            .iter_mut()
            .find(|registration| &registration.id == id)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Registration, id))?;
        registration.status = target;
        let registration = registration.clone();
        self.overwritten(RecordKind::Registration);

        info!(
            registration_id = %id,
            %manager,
            officer = %officer_id,
            project = %project_name,
            status = %target,
            "officer registration decided"
        );
        Ok(registration)
    }

    /// Removes a project's registrations and detaches every officer pointing
    /// at the project.
    pub(crate) fn delete_registrations_for_project(&mut self, project: &ProjectName) {
        let removed: Vec<RegistrationId> = self
            .state
            .registrations
            .iter()
            .filter(|registration| &registration.project == project)
            .map(|registration| registration.id.clone())
            .collect();
        if !removed.is_empty() {
            self.state
                .registrations
                .retain(|registration| &registration.project != project);
            self.overwritten(RecordKind::Registration);
        }

        let mut detached = false;
        for officer in &mut self.state.officers {
            let registered_here = officer
                .registration
                .as_ref()
                .is_some_and(|id| removed.contains(id));
            let assigned_here = officer.assigned_project.as_ref() == Some(project);
            if registered_here || assigned_here {
                officer.registration = None;
                officer.assigned_project = None;
                detached = true;
            }
        }
        if detached {
            self.overwritten(RecordKind::Officer);
        }
    }
}
