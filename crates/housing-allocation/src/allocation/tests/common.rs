use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::allocation::clock::FixedClock;
use crate::allocation::domain::{
    ApplicantProfile, Application, ApplicationId, ApplicationStatus, FlatBooking, FlatType,
    MaritalStatus, Officer, Project, ProjectName, Registration, UserId,
};
use crate::allocation::eligibility::EligibilityPolicy;
use crate::allocation::error::RecordKind;
use crate::allocation::ledger::FlatOffering;
use crate::allocation::repository::{RecordStore, RepositoryError, Storage};
use crate::allocation::service::HousingService;
use crate::allocation::storage::{MemoryStorage, MemoryStore};

pub(super) const MANAGER: &str = "T1234567J";
pub(super) const OTHER_MANAGER: &str = "T7654321K";
/// Single, 40.
pub(super) const ALICE: &str = "S1234567A";
/// Married, 30.
pub(super) const BOB: &str = "S2345678B";
/// Single, 30.
pub(super) const CAROL: &str = "S3456789C";
/// Married, 19.
pub(super) const DAN: &str = "S4567890D";
/// Married, 27.
pub(super) const ERIN: &str = "S5678901E";
/// Officer, married, 33.
pub(super) const OLIVIA: &str = "T2109876H";
/// Officer, single, 36.
pub(super) const OSCAR: &str = "T3210987I";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2025, 3, 1)
}

pub(super) fn user(id: &str) -> UserId {
    UserId::from(id)
}

pub(super) fn name(project: &str) -> ProjectName {
    ProjectName::from(project)
}

pub(super) fn profile(id: &str, name: &str, age: u8, marital_status: MaritalStatus) -> ApplicantProfile {
    ApplicantProfile {
        user_id: user(id),
        name: name.to_string(),
        age,
        marital_status,
    }
}

pub(super) fn applicants() -> Vec<ApplicantProfile> {
    vec![
        profile(ALICE, "Alice", 40, MaritalStatus::Single),
        profile(BOB, "Bob", 30, MaritalStatus::Married),
        profile(CAROL, "Carol", 30, MaritalStatus::Single),
        profile(DAN, "Dan", 19, MaritalStatus::Married),
        profile(ERIN, "Erin", 27, MaritalStatus::Married),
    ]
}

pub(super) fn officers() -> Vec<Officer> {
    vec![
        Officer::new(profile(OLIVIA, "Olivia", 33, MaritalStatus::Married)),
        Officer::new(profile(OSCAR, "Oscar", 36, MaritalStatus::Single)),
    ]
}

/// Visible project open from February to April 2025 owned by [`MANAGER`].
pub(super) fn project(project: &str, offerings: &[(FlatType, u32)]) -> Project {
    Project {
        name: name(project),
        neighborhood: "Yishun".to_string(),
        offerings: offerings
            .iter()
            .map(|&(flat_type, units)| {
                let price = match flat_type {
                    FlatType::TwoRoom => 350_000,
                    FlatType::ThreeRoom => 450_000,
                };
                FlatOffering::new(flat_type, units, price)
            })
            .collect(),
        opening_date: date(2025, 2, 1),
        closing_date: date(2025, 4, 30),
        manager: user(MANAGER),
        officer_slots: 3,
        assigned_officers: Vec::new(),
        visible: true,
    }
}

pub(super) fn with_window(mut project: Project, opening: NaiveDate, closing: NaiveDate) -> Project {
    project.opening_date = opening;
    project.closing_date = closing;
    project
}

/// Project with an officer already assigned, matching what a loaded store
/// looks like after an approved registration.
pub(super) fn staffed(mut project: Project, officer: &str) -> Project {
    project.assigned_officers.push(user(officer));
    project
}

pub(super) fn application(
    id: &str,
    applicant: &str,
    project: &str,
    flat_type: FlatType,
    status: ApplicationStatus,
) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        applicant: user(applicant),
        project: name(project),
        flat_type,
        status,
        submitted_on: date(2025, 2, 10),
        status_before_withdrawal: None,
    }
}

pub(super) fn storage_with(projects: Vec<Project>) -> MemoryStorage {
    MemoryStorage {
        projects: MemoryStore::seeded(projects),
        applicants: MemoryStore::seeded(applicants()),
        officers: MemoryStore::seeded(officers()),
        ..MemoryStorage::default()
    }
}

pub(super) fn service_on<S: Storage + 'static>(storage: Arc<S>, today: NaiveDate) -> HousingService<S> {
    HousingService::load(storage, Arc::new(FixedClock(today)), EligibilityPolicy::default())
        .expect("state loads")
}

pub(super) fn service_with(projects: Vec<Project>) -> (Arc<MemoryStorage>, HousingService<MemoryStorage>) {
    let storage = Arc::new(storage_with(projects));
    let service = service_on(storage.clone(), today());
    (storage, service)
}

/// Wraps a memory store and refuses writes while the switch is on.
pub(super) struct FlakyStore<T> {
    inner: MemoryStore<T>,
    failing: AtomicBool,
}

impl<T> Default for FlakyStore<T> {
    fn default() -> Self {
        Self {
            inner: MemoryStore::default(),
            failing: AtomicBool::new(false),
        }
    }
}

impl<T: Clone> FlakyStore<T> {
    pub(super) fn seeded(records: Vec<T>) -> Self {
        Self {
            inner: MemoryStore::seeded(records),
            failing: AtomicBool::new(false),
        }
    }

    pub(super) fn snapshot(&self) -> Vec<T> {
        self.inner.snapshot()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

impl<T: Clone + Send + Sync> RecordStore<T> for FlakyStore<T> {
    fn load_all(&self) -> Result<Vec<T>, RepositoryError> {
        self.inner.load_all()
    }

    fn append(&self, record: &T) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.append(record)
    }

    fn overwrite_all(&self, records: &[T]) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.overwrite_all(records)
    }
}

/// Storage whose individual record kinds can be made to fail on write.
#[derive(Default)]
pub(super) struct FlakyStorage {
    pub(super) projects: FlakyStore<Project>,
    pub(super) applications: FlakyStore<Application>,
    pub(super) registrations: FlakyStore<Registration>,
    pub(super) bookings: FlakyStore<FlatBooking>,
    pub(super) applicants: FlakyStore<ApplicantProfile>,
    pub(super) officers: FlakyStore<Officer>,
}

impl FlakyStorage {
    pub(super) fn with(projects: Vec<Project>, applications: Vec<Application>) -> Self {
        Self {
            projects: FlakyStore::seeded(projects),
            applications: FlakyStore::seeded(applications),
            applicants: FlakyStore::seeded(applicants()),
            officers: FlakyStore::seeded(officers()),
            ..Self::default()
        }
    }

    pub(super) fn set_failing(&self, kind: RecordKind, failing: bool) {
        let flag = match kind {
            RecordKind::Project => &self.projects.failing,
            RecordKind::Application => &self.applications.failing,
            RecordKind::Registration => &self.registrations.failing,
            RecordKind::Booking => &self.bookings.failing,
            RecordKind::Applicant => &self.applicants.failing,
            RecordKind::Officer => &self.officers.failing,
        };
        flag.store(failing, Ordering::SeqCst);
    }
}

impl Storage for FlakyStorage {
    fn projects(&self) -> &dyn RecordStore<Project> {
        &self.projects
    }

    fn applications(&self) -> &dyn RecordStore<Application> {
        &self.applications
    }

    fn registrations(&self) -> &dyn RecordStore<Registration> {
        &self.registrations
    }

    fn bookings(&self) -> &dyn RecordStore<FlatBooking> {
        &self.bookings
    }

    fn applicants(&self) -> &dyn RecordStore<ApplicantProfile> {
        &self.applicants
    }

    fn officers(&self) -> &dyn RecordStore<Officer> {
        &self.officers
    }
}
