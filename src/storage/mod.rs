//! Versioned storage collaborator.
//!
//! One directory per version holds the four source tables and every artifact
//! derived from them. The pipeline reads and writes through the
//! [`VersionStore`] trait so the backend stays swappable; errors propagate
//! unchanged, with no retries in the pipeline. Concurrent writers against
//! the same version are not coordinated: last writer wins.

pub mod local;

use thiserror::Error;

use crate::table::{Table, TableError, Value};

/// Canonical file names of the four source tables inside a version folder.
pub const WORKFLOWS_FILE: &str = "M_Workflows.csv";
pub const MODELS_FILE: &str = "M_Models.csv";
pub const ELEMENTS_FILE: &str = "M_Elements.csv";
pub const ATTRIBUTES_FILE: &str = "M_Attributes.csv";

/// Name of the merged-data artifact for downstream viewers.
pub fn web_data_file(version: &str) -> String {
    format!("data_for_web_{version}.csv")
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Version '{0}' not found")]
    VersionNotFound(String),

    #[error("File '{file}' not found in version '{version}'")]
    FileNotFound { version: String, file: String },

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

/// Read/write seam between the pipeline and the version folders.
pub trait VersionStore {
    /// All version names, sorted descending so the newest sorts first.
    fn list_versions(&self) -> Result<Vec<String>, StorageError>;

    /// Create an empty version folder. Creating an existing version is not
    /// an error; the folder is simply reused.
    fn create_version(&self, version: &str) -> Result<(), StorageError>;

    /// Read one table file of a version.
    fn load_table(&self, version: &str, file_name: &str) -> Result<Table, StorageError>;

    /// Write one table file of a version, replacing any previous content.
    fn store_table(&self, version: &str, file_name: &str, table: &Table)
        -> Result<(), StorageError>;

    /// Write a rendered artifact's bytes into a version folder.
    fn store_artifact(
        &self,
        version: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError>;

    /// Copy all table files of one version into another (used by project
    /// provisioning). The target version is created if needed.
    fn copy_version_tables(&self, from: &str, to: &str) -> Result<(), StorageError>;
}

/// Encode a table as RFC-4180 CSV: header row, nulls as empty fields,
/// numbers in canonical decimal form.
pub fn table_to_csv(table: &Table) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|v| v.to_field().into_owned()))?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

/// Decode RFC-4180 CSV into a table: first record is the header, empty
/// fields are null, every other field is text.
pub fn table_from_csv(bytes: &[u8]) -> Result<Table, StorageError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut table = Table::new(headers)?;
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(Value::from_csv_field).collect())?;
    }
    Ok(table)
}
