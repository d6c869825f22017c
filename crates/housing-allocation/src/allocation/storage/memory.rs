use std::sync::{Mutex, PoisonError};

use super::super::domain::{
    ApplicantProfile, Application, FlatBooking, Officer, Project, Registration,
};
use super::super::repository::{RecordStore, RepositoryError, Storage};

/// Mutex-backed store used by tests and the command line demo.
#[derive(Debug)]
pub struct MemoryStore<T> {
    records: Mutex<Vec<T>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> MemoryStore<T> {
    pub fn seeded(records: Vec<T>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of what has been persisted so far.
    pub fn snapshot(&self) -> Vec<T> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Clone + Send + Sync> RecordStore<T> for MemoryStore<T> {
    fn load_all(&self) -> Result<Vec<T>, RepositoryError> {
        Ok(self.snapshot())
    }

    fn append(&self, record: &T) -> Result<(), RepositoryError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn overwrite_all(&self, records: &[T]) -> Result<(), RepositoryError> {
        *self.records.lock().unwrap_or_else(PoisonError::into_inner) = records.to_vec();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    pub projects: MemoryStore<Project>,
    pub applications: MemoryStore<Application>,
    pub registrations: MemoryStore<Registration>,
    pub bookings: MemoryStore<FlatBooking>,
    pub applicants: MemoryStore<ApplicantProfile>,
    pub officers: MemoryStore<Officer>,
}

impl Storage for MemoryStorage {
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
