use tracing::{debug, info};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, BookingStatus, Decision, FlatType,
    ProjectName, UserId,
};
use super::eligibility::{can_apply, can_apply_as_officer};
use super::error::{AllocationError, InvariantViolation, RecordKind, ValidationError};
use super::ledger::UnitDelta;
use super::projects::ensure_manager;
use super::state::{AllocationState, Context, Transaction};

impl AllocationState {
    pub(crate) fn application(&self, id: &ApplicationId) -> Result<&Application, AllocationError> {
        self.applications
            .iter()
            .find(|application| &application.id == id)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Application, id))
    }

    fn application_mut(&mut self, id: &ApplicationId) -> Result<&mut Application, AllocationError> {
        self.applications
            .iter_mut()
            .find(|application| &application.id == id)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Application, id))
    }

    /// The latest application of an applicant that has not been withdrawn.
    pub(crate) fn attached_application(&self, applicant: &UserId) -> Option<&Application> {
        self.applications.iter().rev().find(|application| {
            &application.applicant == applicant && application.status != ApplicationStatus::Withdrawn
        })
    }

    pub(crate) fn active_application(&self, applicant: &UserId) -> Option<&Application> {
        self.attached_application(applicant)
            .filter(|application| application.status.is_active())
    }

    pub(crate) fn count_successful(&self, project: &ProjectName, flat_type: FlatType) -> usize {
        self.applications
            .iter()
            .filter(|application| {
                &application.project == project
                    && application.flat_type == flat_type
                    && application.status == ApplicationStatus::Successful
            })
            .count()
    }

    /// Units promised to applicants: successful applications plus withdrawal
    /// requests that fall back to successful if refused.
    pub(crate) fn committed_units(&self, project: &ProjectName, flat_type: FlatType) -> usize {
        self.applications
            .iter()
            .filter(|application| &application.project == project && application.flat_type == flat_type)
            .filter(|application| match application.status {
                ApplicationStatus::Successful => true,
                ApplicationStatus::PendingWithdrawn => {
                    application.status_before_withdrawal == Some(ApplicationStatus::Successful)
                }
                _ => false,
            })
            .count()
    }
}

impl Transaction {
    pub(crate) fn create_application(
        &mut self,
        ctx: Context<'_>,
        applicant: &UserId,
        project: &ProjectName,
        flat_type: FlatType,
    ) -> Result<Application, AllocationError> {
        self.release_expired_assignment(applicant, ctx.today);

        let state = &self.state;
        let profile = state.applicant_profile(applicant)?;
        if let Some(active) = state.active_application(applicant) {
            debug!(%applicant, existing = %active.id, "active application already held");
            return Err(ValidationError::ActiveApplicationExists {
                applicant: applicant.clone(),
            }
            .into());
        }

        let project = state.project(project)?;
        if !project.visible {
            return Err(ValidationError::ProjectHidden {
                project: project.name.clone(),
            }
            .into());
        }
        if project.window_closed(ctx.today) {
            return Err(ValidationError::ApplicationWindowClosed {
                project: project.name.clone(),
                closed_on: project.closing_date,
            }
            .into());
        }
        if !project.offers(flat_type) {
            return Err(ValidationError::FlatTypeNotOffered {
                project: project.name.clone(),
                flat_type,
            }
            .into());
        }

        can_apply(ctx.policy, profile.marital_status, profile.age, flat_type)
            .into_result()
            .map_err(ValidationError::Ineligible)?;
        if let Some(officer) = state.officer(applicant) {
            can_apply_as_officer(&state.officer_standing(officer), project, ctx.today)
                .into_result()
                .map_err(ValidationError::Ineligible)?;
        }

        let application = Application {
            id: ctx.sequences.application_id(&project.name),
            applicant: applicant.clone(),
            project: project.name.clone(),
            flat_type,
            status: ApplicationStatus::Pending,
            submitted_on: ctx.today,
            status_before_withdrawal: None,
        };
        self.state.applications.push(application.clone());
        self.appended(RecordKind::Application);

        info!(
            application_id = %application.id,
            %applicant,
            project = %application.project,
            %flat_type,
            "application submitted"
        );
        Ok(application)
    }

    pub(crate) fn request_withdrawal(
        &mut self,
        applicant: &UserId,
    ) -> Result<Application, AllocationError> {
        let id = self
            .state
            .active_application(applicant)
            .map(|application| application.id.clone())
            .ok_or_else(|| AllocationError::not_found(RecordKind::Application, applicant))?;

        let application = self.state.application_mut(&id)?;
        if application.status == ApplicationStatus::PendingWithdrawn {
            return Err(ValidationError::WithdrawalAlreadyRequested {
                applicant: applicant.clone(),
            }
            .into());
        }
        application.status_before_withdrawal = Some(application.status);
        application.status = ApplicationStatus::PendingWithdrawn;
        let application = application.clone();
        self.overwritten(RecordKind::Application);

        info!(application_id = %id, %applicant, "withdrawal requested");
        Ok(application)
    }

    /// Manager verdict on a pending application. Approval is refused once the
    /// committed applications for the flat type match the units left.
    pub(crate) fn decide_application(
        &mut self,
        manager: &UserId,
        id: &ApplicationId,
        decision: Decision,
    ) -> Result<Application, AllocationError> {
        let application = self.state.application(id)?;
        let project = self.state.project(&application.project)?;
        ensure_manager(project, manager)?;

        let target = match decision {
            Decision::Approve => ApplicationStatus::Successful,
            Decision::Reject => ApplicationStatus::Unsuccessful,
        };
        if application.status != ApplicationStatus::Pending {
            return Err(ValidationError::InvalidApplicationTransition {
                from: application.status,
                to: target,
            }
            .into());
        }

        if decision == Decision::Approve {
            let committed = self
                .state
                .committed_units(&application.project, application.flat_type);
            let available = self
                .state
                .units_available(&application.project, application.flat_type)?;
            if committed >= available as usize {
                debug!(application_id = %id, committed, available, "approval refused for capacity");
                return Err(InvariantViolation::InsufficientUnits {
                    project: application.project.clone(),
                    flat_type: application.flat_type,
                }
                .into());
            }
        }

        let application = self.state.application_mut(id)?;
        application.status = target;
        let application = application.clone();
        self.overwritten(RecordKind::Application);

        info!(application_id = %id, %manager, status = %target, "application decided");
        Ok(application)
    }

    /// Approval retires the application and hands back the unit of an
    /// approved booking; rejection restores the status held before the
    /// request.
    pub(crate) fn decide_withdrawal(
        &mut self,
        manager: &UserId,
        id: &ApplicationId,
        decision: Decision,
    ) -> Result<Application, AllocationError> {
        let application = self.state.application(id)?;
        let project = self.state.project(&application.project)?;
        ensure_manager(project, manager)?;

        if application.status != ApplicationStatus::PendingWithdrawn {
            let to = match decision {
                Decision::Approve => ApplicationStatus::Withdrawn,
                Decision::Reject => application
                    .status_before_withdrawal
                    .unwrap_or(ApplicationStatus::Successful),
            };
            return Err(ValidationError::InvalidApplicationTransition {
                from: application.status,
                to,
            }
            .into());
        }

        let applicant = application.applicant.clone();
        let project = application.project.clone();
        let restored = application.status_before_withdrawal;
        let booking = self
            .state
            .booking_for(&applicant)
            .filter(|booking| booking.project == project)
            .map(|booking| (booking.id.clone(), booking.status, booking.flat_type));

        let status = match decision {
            Decision::Approve => {
                if let Some((booking_id, booking_status, flat_type)) = booking {
                    if booking_status == BookingStatus::Approved {
                        self.adjust_units(&project, flat_type, UnitDelta::Release)?;
                    }
                    self.state.bookings.retain(|booking| booking.id != booking_id);
                    self.overwritten(RecordKind::Booking);
                    info!(%booking_id, %applicant, "booking cancelled by withdrawal");
                }
                ApplicationStatus::Withdrawn
            }
            Decision::Reject => restored.unwrap_or(match booking {
                Some((_, BookingStatus::Approved, _)) => ApplicationStatus::Booked,
                _ => ApplicationStatus::Successful,
            }),
        };

        let application = self.state.application_mut(id)?;
        application.status = status;
        application.status_before_withdrawal = None;
        let application = application.clone();
        self.overwritten(RecordKind::Application);

        info!(application_id = %id, %manager, %status, "withdrawal decided");
        Ok(application)
    }

    pub(crate) fn delete_applications_for_project(&mut self, project: &ProjectName) {
        let before = self.state.applications.len();
        self.state
            .applications
            .retain(|application| &application.project != project);
        if self.state.applications.len() != before {
            self.overwritten(RecordKind::Application);
        }
    }
}
