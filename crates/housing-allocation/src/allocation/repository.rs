use std::path::PathBuf;

use super::domain::{
    ApplicantProfile, Application, FlatBooking, Officer, Project, Registration,
};

/// Persistence collaborator for one record kind. Records come back in the
/// order they were written.
pub trait RecordStore<T>: Send + Sync {
    fn load_all(&self) -> Result<Vec<T>, RepositoryError>;
    fn append(&self, record: &T) -> Result<(), RepositoryError>;
    fn overwrite_all(&self, records: &[T]) -> Result<(), RepositoryError>;
}

/// Bundle of record stores the engine writes through to.
pub trait Storage: Send + Sync {
    fn projects(&self) -> &dyn RecordStore<Project>;
    fn applications(&self) -> &dyn RecordStore<Application>;
    fn registrations(&self) -> &dyn RecordStore<Registration>;
    fn bookings(&self) -> &dyn RecordStore<FlatBooking>;
    fn applicants(&self) -> &dyn RecordStore<ApplicantProfile>;
    fn officers(&self) -> &dyn RecordStore<Officer>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid CSV data in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("invalid record in {} (row {row}): {reason}", path.display())]
    InvalidRecord {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}
