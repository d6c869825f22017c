use std::sync::Arc;

use super::common::*;
use crate::allocation::domain::{
    ApplicationStatus, BookingStatus, Decision, FlatType, MaritalStatus, Project,
};
use crate::allocation::error::{AllocationError, ErrorKind, InvariantViolation, ValidationError};
use crate::allocation::report::BookingReportFilter;
use crate::allocation::service::HousingService;
use crate::allocation::storage::{MemoryStorage, MemoryStore};

fn acacia(two_room_units: u32) -> Project {
    staffed(
        project("Acacia", &[(FlatType::TwoRoom, two_room_units), (FlatType::ThreeRoom, 2)]),
        OLIVIA,
    )
}

/// Service whose store already holds successful applications for the given
/// applicants on Acacia.
fn with_successful(
    project: Project,
    applicants: &[(&str, FlatType)],
) -> (Arc<MemoryStorage>, HousingService<MemoryStorage>) {
    let applications = applicants
        .iter()
        .enumerate()
        .map(|(index, &(applicant, flat_type))| {
            application(
                &format!("APP-Acacia-{}", index + 1),
                applicant,
                "Acacia",
                flat_type,
                ApplicationStatus::Successful,
            )
        })
        .collect();
    let storage = Arc::new(MemoryStorage {
        applications: MemoryStore::seeded(applications),
        ..storage_with(vec![project])
    });
    let service = service_on(storage.clone(), today());
    (storage, service)
}

#[test]
fn last_unit_goes_to_the_first_approved_booking() {
    let (_, service) = with_successful(
        acacia(1),
        &[(BOB, FlatType::TwoRoom), (ERIN, FlatType::TwoRoom)],
    );
    let first = service.create_booking(&user(BOB)).expect("bob books");
    let second = service.create_booking(&user(ERIN)).expect("erin books");

    service
        .approve_booking(&user(OLIVIA), &first.id)
        .expect("first approval");
    assert_eq!(service.units_available(&name("Acacia"), FlatType::TwoRoom).expect("units"), 0);

    match service.approve_booking(&user(OLIVIA), &second.id) {
        Err(AllocationError::Invariant(InvariantViolation::InsufficientUnits { flat_type, .. })) => {
            assert_eq!(flat_type, FlatType::TwoRoom);
        }
        other => panic!("expected capacity error, got {other:?}"),
    }
    assert_eq!(
        service.booking(&second.id).expect("booking").status,
        BookingStatus::Pending
    );
    assert_eq!(
        service.application_for(&user(ERIN)).expect("application").status,
        ApplicationStatus::Successful
    );
}

#[test]
fn approval_books_application_and_consumes_one_unit() {
    let (storage, service) = with_successful(acacia(2), &[(BOB, FlatType::TwoRoom)]);
    let booking = service.create_booking(&user(BOB)).expect("booking");
    assert!(booking.id.0.starts_with(&format!("FL-{BOB}-")));
    assert_eq!(booking.status, BookingStatus::Pending);

    let approved = service
        .approve_booking(&user(OLIVIA), &booking.id)
        .expect("approval");

    assert_eq!(approved.status, BookingStatus::Approved);
    assert_eq!(approved.approved_on, Some(today()));
    assert_eq!(
        service.application_for(&user(BOB)).expect("application").status,
        ApplicationStatus::Booked
    );
    assert_eq!(service.units_available(&name("Acacia"), FlatType::TwoRoom).expect("units"), 1);
    assert_eq!(service.count_successful(&name("Acacia"), FlatType::TwoRoom), 0);
    assert_eq!(storage.bookings.snapshot(), vec![approved]);
    let stored_units = storage.projects.snapshot()[0]
        .offering(FlatType::TwoRoom)
        .expect("offering")
        .units_available();
    assert_eq!(stored_units, 1);
}

#[test]
fn approving_twice_is_refused_and_ledger_moves_once() {
    let (_, service) = with_successful(acacia(2), &[(BOB, FlatType::TwoRoom)]);
    let booking = service.create_booking(&user(BOB)).expect("booking");
    service
        .approve_booking(&user(OLIVIA), &booking.id)
        .expect("approval");

    match service.approve_booking(&user(OLIVIA), &booking.id) {
        Err(AllocationError::Invariant(InvariantViolation::BookingAlreadyApproved(id))) => {
            assert_eq!(id, booking.id);
        }
        other => panic!("expected double approval refusal, got {other:?}"),
    }
    assert_eq!(service.units_available(&name("Acacia"), FlatType::TwoRoom).expect("units"), 1);
}

#[test]
fn bookings_need_a_successful_application() {
    let (_, service) = service_with(vec![acacia(2)]);
    service
        .create_application(&user(BOB), &name("Acacia"), FlatType::TwoRoom)
        .expect("application");

    match service.create_booking(&user(BOB)) {
        Err(AllocationError::Validation(ValidationError::ApplicationNotSuccessful { status })) => {
            assert_eq!(status, ApplicationStatus::Pending);
        }
        other => panic!("expected not successful, got {other:?}"),
    }

    let err = service.create_booking(&user(ERIN)).expect_err("no application");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn one_booking_per_applicant() {
    let (_, service) = with_successful(acacia(2), &[(BOB, FlatType::TwoRoom)]);
    service.create_booking(&user(BOB)).expect("booking");

    match service.create_booking(&user(BOB)) {
        Err(AllocationError::Invariant(InvariantViolation::AlreadyBooked(applicant))) => {
            assert_eq!(applicant, user(BOB));
        }
        other => panic!("expected already booked, got {other:?}"),
    }
}

#[test]
fn only_assigned_officers_approve_bookings() {
    let (_, service) = with_successful(acacia(2), &[(BOB, FlatType::TwoRoom)]);
    let booking = service.create_booking(&user(BOB)).expect("booking");

    let err = service
        .approve_booking(&user(OSCAR), &booking.id)
        .expect_err("oscar is not assigned");
    assert!(matches!(
        err,
        AllocationError::Validation(ValidationError::NotAssignedOfficer { .. })
    ));

    let err = service
        .approve_booking(&user(MANAGER), &booking.id)
        .expect_err("managers are not officers");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn withdrawing_a_booked_flat_returns_the_unit() {
    let (storage, service) = with_successful(acacia(2), &[(BOB, FlatType::TwoRoom)]);
    let booking = service.create_booking(&user(BOB)).expect("booking");
    service
        .approve_booking(&user(OLIVIA), &booking.id)
        .expect("approval");
    assert_eq!(service.units_available(&name("Acacia"), FlatType::TwoRoom).expect("units"), 1);

    let requested = service.request_withdrawal(&user(BOB)).expect("request");
    assert_eq!(requested.status_before_withdrawal, Some(ApplicationStatus::Booked));
    let withdrawn = service
        .decide_withdrawal(&user(MANAGER), &requested.id, Decision::Approve)
        .expect("approved withdrawal");

    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
    assert_eq!(service.units_available(&name("Acacia"), FlatType::TwoRoom).expect("units"), 2);
    assert_eq!(service.booking_for(&user(BOB)), None);
    assert!(storage.bookings.snapshot().is_empty());
}

#[test]
fn rejected_withdrawal_of_booked_flat_keeps_the_booking() {
    let (_, service) = with_successful(acacia(2), &[(BOB, FlatType::TwoRoom)]);
    let booking = service.create_booking(&user(BOB)).expect("booking");
    service
        .approve_booking(&user(OLIVIA), &booking.id)
        .expect("approval");
    let requested = service.request_withdrawal(&user(BOB)).expect("request");

    let restored = service
        .decide_withdrawal(&user(MANAGER), &requested.id, Decision::Reject)
        .expect("rejected withdrawal");

    assert_eq!(restored.status, ApplicationStatus::Booked);
    assert!(service.booking_for(&user(BOB)).is_some());
    assert_eq!(service.units_available(&name("Acacia"), FlatType::TwoRoom).expect("units"), 1);
}

#[test]
fn withdrawing_before_approval_drops_the_pending_booking_only() {
    let (_, service) = with_successful(acacia(2), &[(BOB, FlatType::TwoRoom)]);
    service.create_booking(&user(BOB)).expect("booking");
    let requested = service.request_withdrawal(&user(BOB)).expect("request");

    service
        .decide_withdrawal(&user(MANAGER), &requested.id, Decision::Approve)
        .expect("approved withdrawal");

    assert_eq!(service.booking_for(&user(BOB)), None);
    assert_eq!(service.units_available(&name("Acacia"), FlatType::TwoRoom).expect("units"), 2);
}

#[test]
fn receipt_describes_the_approved_booking() {
    let (_, service) = with_successful(acacia(2), &[(BOB, FlatType::ThreeRoom)]);
    let booking = service.create_booking(&user(BOB)).expect("booking");

    let err = service.receipt(&user(BOB)).expect_err("not yet approved");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    service
        .approve_booking(&user(OLIVIA), &booking.id)
        .expect("approval");
    let receipt = service.receipt(&user(BOB)).expect("receipt");

    assert_eq!(receipt.applicant_name, "Bob");
    assert_eq!(receipt.marital_status, MaritalStatus::Married);
    assert_eq!(receipt.flat_type, FlatType::ThreeRoom);
    assert_eq!(receipt.neighborhood, "Yishun");
    assert_eq!(receipt.price, 450_000);
    assert_eq!(receipt.booked_on, today());
    assert!(receipt.to_string().contains("3-Room"));
}

#[test]
fn booking_report_filters_approved_bookings() {
    let (_, service) = with_successful(
        acacia(3),
        &[
            (BOB, FlatType::TwoRoom),
            (ERIN, FlatType::ThreeRoom),
            (ALICE, FlatType::TwoRoom),
        ],
    );
    for applicant in [BOB, ERIN, ALICE] {
        let booking = service.create_booking(&user(applicant)).expect("booking");
        if applicant != ALICE {
            service
                .approve_booking(&user(OLIVIA), &booking.id)
                .expect("approval");
        }
    }

    assert_eq!(service.booking_report(&BookingReportFilter::default()).len(), 2);
    let married_three_room = service.booking_report(&BookingReportFilter {
        marital_status: Some(MaritalStatus::Married),
        flat_type: Some(FlatType::ThreeRoom),
        project: Some(name("ACACIA")),
    });
    assert_eq!(married_three_room.len(), 1);
    assert_eq!(married_three_room[0].name, "Erin");
    assert!(service
        .booking_report(&BookingReportFilter {
            marital_status: Some(MaritalStatus::Single),
            ..BookingReportFilter::default()
        })
        .is_empty());
    assert_eq!(service.bookings(Some(BookingStatus::Pending)).len(), 1);
}
