use tracing::{debug, info};

use super::domain::{
    ApplicationStatus, BookingId, BookingStatus, FlatBooking, FlatType, ProjectName, UserId,
};
use super::error::{AllocationError, InvariantViolation, RecordKind, ValidationError};
use super::ledger::UnitDelta;
use super::state::{AllocationState, Context, Transaction};

impl AllocationState {
    pub(crate) fn booking(&self, id: &BookingId) -> Result<&FlatBooking, AllocationError> {
        self.bookings
            .iter()
            .find(|booking| &booking.id == id)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Booking, id))
    }

    pub(crate) fn booking_for(&self, applicant: &UserId) -> Option<&FlatBooking> {
        self.bookings
            .iter()
            .find(|booking| &booking.applicant == applicant)
    }

    /// Any booking of this flat type, pending or approved, or a booked
    /// application that still expects one.
    pub(crate) fn has_bookings(&self, project: &ProjectName, flat_type: FlatType) -> bool {
        let booked = self
            .bookings
            .iter()
            .any(|booking| &booking.project == project && booking.flat_type == flat_type);
        booked
            || self.applications.iter().any(|application| {
                &application.project == project
                    && application.flat_type == flat_type
                    && (application.status == ApplicationStatus::Booked
                        || (application.status == ApplicationStatus::PendingWithdrawn
                            && application.status_before_withdrawal
                                == Some(ApplicationStatus::Booked)))
            })
    }
}

impl Transaction {
    /// Turns the applicant's successful application into a pending booking for
    /// the same project and flat type.
    pub(crate) fn create_booking(
        &mut self,
        ctx: Context<'_>,
        applicant: &UserId,
    ) -> Result<FlatBooking, AllocationError> {
        let application = self
            .state
            .active_application(applicant)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Application, applicant))?;

        if application.status == ApplicationStatus::Booked || self.state.booking_for(applicant).is_some() {
            debug!(%applicant, "booking already exists");
            return Err(InvariantViolation::AlreadyBooked(applicant.clone()).into());
        }
        if application.status != ApplicationStatus::Successful {
            return Err(ValidationError::ApplicationNotSuccessful {
                status: application.status,
            }
            .into());
        }

        let booking = FlatBooking {
            id: ctx.sequences.booking_id(applicant),
            applicant: applicant.clone(),
            flat_type: application.flat_type,
            project: application.project.clone(),
            status: BookingStatus::Pending,
            requested_on: ctx.today,
            approved_on: None,
        };
        self.state.bookings.push(booking.clone());
        self.appended(RecordKind::Booking);

        info!(
            booking_id = %booking.id,
            %applicant,
            project = %booking.project,
            flat_type = %booking.flat_type,
            "flat booking requested"
        );
        Ok(booking)
    }

    /// The only runtime path that consumes a unit: the ledger reservation, the
    /// application moving to BOOKED and the booking approval land together.
    pub(crate) fn approve_booking(
        &mut self,
        ctx: Context<'_>,
        officer: &UserId,
        id: &BookingId,
    ) -> Result<FlatBooking, AllocationError> {
        let booking = self.state.booking(id)?;
        if booking.status == BookingStatus::Approved {
            return Err(InvariantViolation::BookingAlreadyApproved(id.clone()).into());
        }
        if self.state.officer(officer).is_none() {
            return Err(AllocationError::not_found(RecordKind::Officer, officer));
        }
        let project = self.state.project(&booking.project)?;
        if !project.has_officer(officer) {
            return Err(ValidationError::NotAssignedOfficer {
                officer: officer.clone(),
                project: project.name.clone(),
            }
            .into());
        }

        let applicant = booking.applicant.clone();
        let project_name = booking.project.clone();
        let flat_type = booking.flat_type;
        let application_id = match self.state.active_application(&applicant) {
            Some(application)
                if application.status == ApplicationStatus::Successful
                    && application.project == project_name =>
            {
                application.id.clone()
            }
            Some(application) => {
                return Err(ValidationError::ApplicationNotSuccessful {
                    status: application.status,
                }
                .into())
            }
            None => return Err(AllocationError::not_found(RecordKind::Application, &applicant)),
        };

        self.adjust_units(&project_name, flat_type, UnitDelta::Reserve)?;

        if let Some(application) = self
            .state
            .applications
            .iter_mut()
            .find(|application| application.id == application_id)
        {
            application.status = ApplicationStatus::Booked;
        }
        self.overwritten(RecordKind::Application);

        let booking = self
            .state
            .bookings
            .iter_mut()
            .find(|booking| &booking.id == id)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Booking, id))?;
        booking.status = BookingStatus::Approved;
        booking.approved_on = Some(ctx.today);
        let booking = booking.clone();
        self.overwritten(RecordKind::Booking);

        info!(
            booking_id = %id,
            %officer,
            %applicant,
            application_id = %application_id,
            project = %project_name,
            %flat_type,
            "flat booking approved"
        );
        Ok(booking)
    }

    pub(crate) fn delete_bookings_for_project(&mut self, project: &ProjectName) {
        let before = self.state.bookings.len();
        self.state
            .bookings
            .retain(|booking| &booking.project != project);
        if self.state.bookings.len() != before {
            self.overwritten(RecordKind::Booking);
        }
    }
}
