use std::fs::{self, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::super::domain::{
    ApplicantProfile, Application, FlatBooking, FlatType, MaritalStatus, Officer, Project,
    ProjectName, Registration, RegistrationId, UserId,
};
use super::super::ledger::FlatOffering;
use super::super::repository::{RecordStore, RepositoryError, Storage};

/// Mapping between a record and its CSV row.
pub trait CsvRecord: Sized + Send + Sync {
    const FILE_NAME: &'static str;
    type Row: Serialize + DeserializeOwned;

    fn to_row(&self) -> Self::Row;
    fn from_row(row: Self::Row) -> Result<Self, String>;
}

/// One CSV file holding every record of a kind, header first.
#[derive(Debug)]
pub struct CsvStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: CsvRecord> CsvStore<T> {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(T::FILE_NAME),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RepositoryError {
        RepositoryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> RepositoryError {
        RepositoryError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T: CsvRecord> RecordStore<T> for CsvStore<T> {
    fn load_all(&self) -> Result<Vec<T>, RepositoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|err| self.csv_error(err))?;

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<T::Row>().enumerate() {
            let row = row.map_err(|err| self.csv_error(err))?;
            let record = T::from_row(row).map_err(|reason| RepositoryError::InvalidRecord {
                path: self.path.clone(),
                row: index + 1,
                reason,
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn append(&self, record: &T) -> Result<(), RepositoryError> {
        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.io_error(err))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(record.to_row())
            .map_err(|err| self.csv_error(err))?;
        writer.flush().map_err(|err| self.io_error(err))
    }

    /// Rewrites the file through a sibling temp file so a failed write never
    /// leaves a truncated store behind.
    fn overwrite_all(&self, records: &[T]) -> Result<(), RepositoryError> {
        let staging = self.path.with_extension("csv.tmp");
        let mut writer = csv::WriterBuilder::new()
            .from_path(&staging)
            .map_err(|err| self.csv_error(err))?;
        for record in records {
            writer
                .serialize(record.to_row())
                .map_err(|err| self.csv_error(err))?;
        }
        writer.flush().map_err(|err| self.io_error(err))?;
        drop(writer);

        fs::rename(&staging, &self.path).map_err(|err| self.io_error(err))
    }
}

/// CSV-backed storage rooted at a data directory.
#[derive(Debug)]
pub struct CsvStorage {
    dir: PathBuf,
    projects: CsvStore<Project>,
    applications: CsvStore<Application>,
    registrations: CsvStore<Registration>,
    bookings: CsvStore<FlatBooking>,
    applicants: CsvStore<ApplicantProfile>,
    officers: CsvStore<Officer>,
}

impl CsvStorage {
    /// Opens (creating if needed) the data directory. Missing files read as
    /// empty stores.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| RepositoryError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            projects: CsvStore::in_dir(&dir),
            applications: CsvStore::in_dir(&dir),
            registrations: CsvStore::in_dir(&dir),
            bookings: CsvStore::in_dir(&dir),
            applicants: CsvStore::in_dir(&dir),
            officers: CsvStore::in_dir(&dir),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Storage for CsvStorage {
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

macro_rules! flat_record {
    ($($ty:ty => $file:literal),* $(,)?) => {
        $(impl CsvRecord for $ty {
            const FILE_NAME: &'static str = $file;
            type Row = $ty;

            fn to_row(&self) -> Self::Row {
                self.clone()
            }

            fn from_row(row: Self::Row) -> Result<Self, String> {
                Ok(row)
            }
        })*
    };
}

flat_record!(
    Application => "applications.csv",
    Registration => "registrations.csv",
    FlatBooking => "bookings.csv",
    ApplicantProfile => "applicants.csv",
);

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectRow {
    name: String,
    neighborhood: String,
    flat_type_1: FlatType,
    units_1: u32,
    price_1: u32,
    #[serde(default)]
    flat_type_2: Option<FlatType>,
    #[serde(default)]
    units_2: Option<u32>,
    #[serde(default)]
    price_2: Option<u32>,
    opening_date: NaiveDate,
    closing_date: NaiveDate,
    manager: String,
    officer_slots: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    officers: Option<String>,
    visible: bool,
}

impl CsvRecord for Project {
    const FILE_NAME: &'static str = "projects.csv";
    type Row = ProjectRow;

    fn to_row(&self) -> ProjectRow {
        let first = self.offerings.first();
        let second = self.offerings.get(1);
        let officers = self
            .assigned_officers
            .iter()
            .map(|officer| officer.0.as_str())
            .collect::<Vec<_>>()
            .join(";");
        ProjectRow {
            name: self.name.to_string(),
            neighborhood: self.neighborhood.clone(),
            flat_type_1: first.map_or(FlatType::smallest(), FlatOffering::flat_type),
            units_1: first.map_or(0, FlatOffering::units_available),
            price_1: first.map_or(0, FlatOffering::price),
            flat_type_2: second.map(FlatOffering::flat_type),
            units_2: second.map(FlatOffering::units_available),
            price_2: second.map(FlatOffering::price),
            opening_date: self.opening_date,
            closing_date: self.closing_date,
            manager: self.manager.0.clone(),
            officer_slots: self.officer_slots,
            officers: (!officers.is_empty()).then_some(officers),
            visible: self.visible,
        }
    }

    fn from_row(row: ProjectRow) -> Result<Self, String> {
        let mut offerings = vec![FlatOffering::new(row.flat_type_1, row.units_1, row.price_1)];
        match (row.flat_type_2, row.units_2) {
            (Some(flat_type), Some(units)) => {
                offerings.push(FlatOffering::new(flat_type, units, row.price_2.unwrap_or(0)));
            }
            (None, None) => {}
            _ => return Err("second flat type and its unit count must be given together".to_string()),
        }
        if offerings.len() == 2 && offerings[0].flat_type() == offerings[1].flat_type() {
            return Err(format!("flat type {} listed twice", row.flat_type_1));
        }
        offerings.sort_by_key(FlatOffering::flat_type);

        let assigned_officers = row
            .officers
            .as_deref()
            .map(|joined| {
                joined
                    .split(';')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(UserId::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Project {
            name: ProjectName::from(row.name.as_str()),
            neighborhood: row.neighborhood,
            offerings,
            opening_date: row.opening_date,
            closing_date: row.closing_date,
            manager: UserId::from(row.manager.as_str()),
            officer_slots: row.officer_slots,
            assigned_officers,
            visible: row.visible,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OfficerRow {
    user_id: String,
    name: String,
    age: u8,
    marital_status: MaritalStatus,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    assigned_project: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    registration: Option<String>,
}

impl CsvRecord for Officer {
    const FILE_NAME: &'static str = "officers.csv";
    type Row = OfficerRow;

    fn to_row(&self) -> OfficerRow {
        OfficerRow {
            user_id: self.profile.user_id.0.clone(),
            name: self.profile.name.clone(),
            age: self.profile.age,
            marital_status: self.profile.marital_status,
            assigned_project: self.assigned_project.as_ref().map(ToString::to_string),
            registration: self.registration.as_ref().map(|id| id.0.clone()),
        }
    }

    fn from_row(row: OfficerRow) -> Result<Self, String> {
        Ok(Officer {
            profile: ApplicantProfile {
                user_id: UserId::from(row.user_id.as_str()),
                name: row.name,
                age: row.age,
                marital_status: row.marital_status,
            },
            assigned_project: row.assigned_project.as_deref().map(ProjectName::from),
            registration: row.registration.map(RegistrationId),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
