use std::sync::Arc;

use chrono::NaiveDate;
use housing_allocation::allocation::{
    AllocationError, ApplicantProfile, Application, ApplicationFilter, ApplicationId,
    ApplicationStatus, BookingStatus, Decision, DenialReason, EligibilityPolicy, ErrorKind,
    FixedClock, FlatOffering, FlatType, HousingService, InvariantViolation, MaritalStatus,
    MemoryStorage, MemoryStore, ProjectDraft, ProjectName, UserId, ValidationError,
};

const MANAGER: &str = "T8800112M";
const OFFICER: &str = "T4455667K";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn user(id: &str) -> UserId {
    UserId::from(id)
}

fn acacia() -> ProjectName {
    ProjectName::from("Acacia")
}

fn resident(id: &str, name: &str, age: u8, marital_status: MaritalStatus) -> ApplicantProfile {
    ApplicantProfile {
        user_id: user(id),
        name: name.to_string(),
        age,
        marital_status,
    }
}

fn draft(name: &str, two_room: u32, three_room: u32, opening: NaiveDate, closing: NaiveDate) -> ProjectDraft {
    ProjectDraft {
        name: name.to_string(),
        neighborhood: "Yishun".to_string(),
        offerings: vec![
            FlatOffering::new(FlatType::TwoRoom, two_room, 320_000),
            FlatOffering::new(FlatType::ThreeRoom, three_room, 410_000),
        ],
        opening_date: opening,
        closing_date: closing,
        officer_slots: 2,
        visible: true,
    }
}

fn service_over(storage: MemoryStorage) -> HousingService<MemoryStorage> {
    HousingService::load(
        Arc::new(storage),
        Arc::new(FixedClock(date(2025, 3, 1))),
        EligibilityPolicy::default(),
    )
    .expect("state loads")
}

/// Fresh engine with Acacia listed and one officer assigned to it, built only
/// through public entry points.
fn staffed_engine(two_room: u32, three_room: u32) -> HousingService<MemoryStorage> {
    let service = service_over(MemoryStorage::default());
    service
        .register_officer(resident(OFFICER, "Priya", 31, MaritalStatus::Married))
        .expect("officer account");
    service
        .create_project(
            &user(MANAGER),
            draft("Acacia", two_room, three_room, date(2025, 2, 1), date(2025, 4, 30)),
        )
        .expect("project listed");
    let registration = service
        .create_registration(&user(OFFICER), &acacia())
        .expect("registration");
    service
        .decide_registration(&user(MANAGER), &registration.id, Decision::Approve)
        .expect("registration approved");
    service
}

fn successful(id: &str, applicant: &str, flat_type: FlatType) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        applicant: user(applicant),
        project: acacia(),
        flat_type,
        status: ApplicationStatus::Successful,
        submitted_on: date(2025, 2, 3),
        status_before_withdrawal: None,
    }
}

#[test]
fn single_applicants_are_limited_to_two_room_flats() {
    let service = staffed_engine(2, 2);
    service
        .register_applicant(resident("S1000001A", "Mei", 40, MaritalStatus::Single))
        .expect("applicant account");

    match service.create_application(&user("S1000001A"), &acacia(), FlatType::ThreeRoom) {
        Err(AllocationError::Validation(ValidationError::Ineligible(
            DenialReason::SingleRestrictedToSmallest { .. },
        ))) => {}
        other => panic!("expected three room denial, got {other:?}"),
    }

    let application = service
        .create_application(&user("S1000001A"), &acacia(), FlatType::TwoRoom)
        .expect("two room allowed");
    assert_eq!(application.status, ApplicationStatus::Pending);
}

#[test]
fn manager_cannot_approve_past_remaining_units() {
    let service = staffed_engine(1, 1);
    for (id, name) in [("S2000001B", "Wei"), ("S2000002C", "Nur")] {
        service
            .register_applicant(resident(id, name, 29, MaritalStatus::Married))
            .expect("applicant account");
    }
    let first = service
        .create_application(&user("S2000001B"), &acacia(), FlatType::TwoRoom)
        .expect("first application");
    let second = service
        .create_application(&user("S2000002C"), &acacia(), FlatType::TwoRoom)
        .expect("second application");

    service
        .decide_application(&user(MANAGER), &first.id, Decision::Approve)
        .expect("first approval");
    let err = service
        .decide_application(&user(MANAGER), &second.id, Decision::Approve)
        .expect_err("no units left for a second approval");

    assert_eq!(err.kind(), ErrorKind::Invariant);
    assert_eq!(service.count_successful(&acacia(), FlatType::TwoRoom), 1);
    assert_eq!(
        service.application(&second.id).expect("application").status,
        ApplicationStatus::Pending
    );

    let rejected = service
        .decide_application(&user(MANAGER), &second.id, Decision::Reject)
        .expect("rejection always allowed");
    assert_eq!(rejected.status, ApplicationStatus::Unsuccessful);
}

#[test]
fn last_unit_is_booked_once() {
    let storage = MemoryStorage {
        applications: MemoryStore::seeded(vec![
            successful("APP-Acacia-1", "S3000001D", FlatType::TwoRoom),
            successful("APP-Acacia-2", "S3000002E", FlatType::TwoRoom),
        ]),
        applicants: MemoryStore::seeded(vec![
            resident("S3000001D", "Hui", 33, MaritalStatus::Married),
            resident("S3000002E", "Raj", 34, MaritalStatus::Married),
        ]),
        ..MemoryStorage::default()
    };
    let service = service_over(storage);
    service
        .register_officer(resident(OFFICER, "Priya", 31, MaritalStatus::Married))
        .expect("officer account");
    service
        .create_project(
            &user(MANAGER),
            draft("Acacia", 1, 1, date(2025, 2, 1), date(2025, 4, 30)),
        )
        .expect("project listed");
    let registration = service
        .create_registration(&user(OFFICER), &acacia())
        .expect("registration");
    service
        .decide_registration(&user(MANAGER), &registration.id, Decision::Approve)
        .expect("registration approved");

    let first = service.create_booking(&user("S3000001D")).expect("first booking");
    let second = service.create_booking(&user("S3000002E")).expect("second booking");

    let approved = service
        .approve_booking(&user(OFFICER), &first.id)
        .expect("first booking approved");
    assert_eq!(approved.status, BookingStatus::Approved);
    assert_eq!(service.units_available(&acacia(), FlatType::TwoRoom).expect("units"), 0);

    match service.approve_booking(&user(OFFICER), &second.id) {
        Err(AllocationError::Invariant(InvariantViolation::InsufficientUnits { .. })) => {}
        other => panic!("expected capacity error, got {other:?}"),
    }
    assert!(matches!(
        service.approve_booking(&user(OFFICER), &first.id),
        Err(AllocationError::Invariant(InvariantViolation::BookingAlreadyApproved(_)))
    ));
    assert_eq!(service.units_available(&acacia(), FlatType::TwoRoom).expect("units"), 0);
}

#[test]
fn assigned_officer_is_denied_overlapping_projects() {
    let service = staffed_engine(2, 2);
    service
        .create_project(
            &user(MANAGER),
            draft("Birch", 2, 2, date(2025, 4, 1), date(2025, 6, 30)),
        )
        .expect("overlapping project");
    service
        .create_project(
            &user(MANAGER),
            draft("Cedar", 2, 2, date(2025, 2, 1), date(2025, 3, 31)),
        )
        .expect("another overlapping project");

    let err = service
        .create_application(&user(OFFICER), &ProjectName::from("Birch"), FlatType::ThreeRoom)
        .expect_err("dates overlap Acacia");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(service
        .create_application(&user(OFFICER), &ProjectName::from("cedar"), FlatType::ThreeRoom)
        .is_err());
    assert_eq!(service.application_for(&user(OFFICER)), None);
}

#[test]
fn booked_flat_withdrawal_returns_the_unit() {
    let service = staffed_engine(2, 2);
    let applicant = "S4000001F";
    service
        .register_applicant(resident(applicant, "Aisha", 36, MaritalStatus::Married))
        .expect("applicant account");

    let application = service
        .create_application(&user(applicant), &acacia(), FlatType::ThreeRoom)
        .expect("application");
    service
        .decide_application(&user(MANAGER), &application.id, Decision::Approve)
        .expect("approved");
    let booking = service.create_booking(&user(applicant)).expect("booking");
    service
        .approve_booking(&user(OFFICER), &booking.id)
        .expect("booking approved");
    assert_eq!(service.units_available(&acacia(), FlatType::ThreeRoom).expect("units"), 1);
    assert_eq!(
        service.application(&application.id).expect("application").status,
        ApplicationStatus::Booked
    );

    service.request_withdrawal(&user(applicant)).expect("withdrawal requested");
    let pending = service.applications(
        &ApplicationFilter::for_project("Acacia").with_status(ApplicationStatus::PendingWithdrawn),
    );
    assert_eq!(pending.len(), 1);

    let withdrawn = service
        .decide_withdrawal(&user(MANAGER), &application.id, Decision::Approve)
        .expect("withdrawal approved");
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
    assert_eq!(service.booking_for(&user(applicant)), None);
    assert_eq!(service.units_available(&acacia(), FlatType::ThreeRoom).expect("units"), 2);

    let again = service
        .create_application(&user(applicant), &acacia(), FlatType::TwoRoom)
        .expect("withdrawn applicants may apply again");
    assert_ne!(again.id, application.id);
}
