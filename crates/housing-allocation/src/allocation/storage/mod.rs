//! Record store implementations.

mod csv_store;
mod memory;

pub use csv_store::{CsvRecord, CsvStorage, CsvStore, OfficerRow, ProjectRow};
pub use memory::{MemoryStorage, MemoryStore};
