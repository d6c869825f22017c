use std::sync::atomic::{AtomicU64, Ordering};

use super::domain::{ApplicationId, BookingId, ProjectName, RegistrationId, UserId};
use super::state::AllocationState;

/// Monotonic counter seeded past the highest numeric suffix already issued.
#[derive(Debug)]
pub(crate) struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    pub(crate) fn starting_after<'a>(issued: impl IntoIterator<Item = &'a str>) -> Self {
        let highest = issued
            .into_iter()
            .filter_map(|id| id.rsplit('-').next()?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            next: AtomicU64::new(highest + 1),
        }
    }

    pub(crate) fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub(crate) struct Sequences {
    applications: IdSequence,
    registrations: IdSequence,
    bookings: IdSequence,
}

impl Sequences {
    pub(crate) fn seeded_from(state: &AllocationState) -> Self {
        Self {
            applications: IdSequence::starting_after(
                state.applications.iter().map(|record| record.id.0.as_str()),
            ),
            registrations: IdSequence::starting_after(
                state.registrations.iter().map(|record| record.id.0.as_str()),
            ),
            bookings: IdSequence::starting_after(
                state.bookings.iter().map(|record| record.id.0.as_str()),
            ),
        }
    }

    pub(crate) fn application_id(&self, project: &ProjectName) -> ApplicationId {
        ApplicationId(format!("APP-{}-{}", project, self.applications.next()))
    }

    pub(crate) fn registration_id(&self, project: &ProjectName) -> RegistrationId {
        RegistrationId(format!("REG-{}-{}", project, self.registrations.next()))
    }

    pub(crate) fn booking_id(&self, applicant: &UserId) -> BookingId {
        BookingId(format!("FL-{}-{}", applicant, self.bookings.next()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_continues_after_highest_suffix() {
        let sequence = IdSequence::starting_after(["APP-Acacia-3", "APP-Birch-12", "garbage"]);
        assert_eq!(sequence.next(), 13);
        assert_eq!(sequence.next(), 14);
    }

    #[test]
    fn empty_history_starts_at_one() {
        let sequence = IdSequence::starting_after(std::iter::empty());
        assert_eq!(sequence.next(), 1);
    }
}
