use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    BookingId, BookingStatus, FlatType, MaritalStatus, ProjectName, UserId,
};
use super::error::{AllocationError, RecordKind};
use super::state::AllocationState;

/// Filters for the approved-bookings report; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingReportFilter {
    pub marital_status: Option<MaritalStatus>,
    pub flat_type: Option<FlatType>,
    pub project: Option<ProjectName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReportRow {
    pub booking_id: BookingId,
    pub applicant: UserId,
    pub name: String,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub project: ProjectName,
    pub flat_type: FlatType,
}

/// Proof of an approved booking handed to the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub applicant_name: String,
    pub applicant_id: UserId,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub flat_type: FlatType,
    pub project: ProjectName,
    pub neighborhood: String,
    pub price: u32,
    pub booked_on: NaiveDate,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Booking receipt")?;
        writeln!(f, "  applicant:      {} ({})", self.applicant_name, self.applicant_id)?;
        writeln!(f, "  age:            {}", self.age)?;
        writeln!(f, "  marital status: {}", self.marital_status.label())?;
        writeln!(f, "  flat type:      {}", self.flat_type.label())?;
        writeln!(f, "  project:        {} ({})", self.project, self.neighborhood)?;
        writeln!(f, "  price:          ${}", self.price)?;
        write!(f, "  booked on:      {}", self.booked_on)
    }
}

impl AllocationState {
    pub(crate) fn booking_report(&self, filter: &BookingReportFilter) -> Vec<BookingReportRow> {
        self.bookings
            .iter()
            .filter(|booking| booking.status == BookingStatus::Approved)
            .filter(|booking| filter.flat_type.map_or(true, |wanted| booking.flat_type == wanted))
            .filter(|booking| {
                filter
                    .project
                    .as_ref()
                    .map_or(true, |wanted| &booking.project == wanted)
            })
            .filter_map(|booking| {
                let profile = self.applicant_profile(&booking.applicant).ok()?;
                Some(BookingReportRow {
                    booking_id: booking.id.clone(),
                    applicant: booking.applicant.clone(),
                    name: profile.name.clone(),
                    age: profile.age,
                    marital_status: profile.marital_status,
                    project: booking.project.clone(),
                    flat_type: booking.flat_type,
                })
            })
            .filter(|row| {
                filter
                    .marital_status
                    .map_or(true, |wanted| row.marital_status == wanted)
            })
            .collect()
    }

    pub(crate) fn receipt(&self, applicant: &UserId) -> Result<Receipt, AllocationError> {
        let booking = self
            .booking_for(applicant)
            .filter(|booking| booking.status == BookingStatus::Approved)
            .ok_or_else(|| AllocationError::not_found(RecordKind::Booking, applicant))?;
        let profile = self.applicant_profile(applicant)?;
        let project = self.project(&booking.project)?;

        Ok(Receipt {
            applicant_name: profile.name.clone(),
            applicant_id: profile.user_id.clone(),
            age: profile.age,
            marital_status: profile.marital_status,
            flat_type: booking.flat_type,
            project: project.name.clone(),
            neighborhood: project.neighborhood.clone(),
            price: project
                .offering(booking.flat_type)
                .map_or(0, |offering| offering.price()),
            booked_on: booking.approved_on.unwrap_or(booking.requested_on),
        })
    }
}
