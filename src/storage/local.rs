//! Local filesystem backend: one directory per version under a root.

use std::fs;
use std::path::{Path, PathBuf};

use crate::table::Table;

use super::{table_from_csv, table_to_csv, StorageError, VersionStore};

/// Version store over a local data directory.
#[derive(Debug, Clone)]
pub struct LocalVersionStore {
    root: PathBuf,
}

impl LocalVersionStore {
    pub fn new(root: impl Into<PathBuf>) -> LocalVersionStore {
        LocalVersionStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    fn existing_version_dir(&self, version: &str) -> Result<PathBuf, StorageError> {
        let dir = self.version_dir(version);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(StorageError::VersionNotFound(version.to_string()))
        }
    }
}

impl VersionStore for LocalVersionStore {
    fn list_versions(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                versions.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        versions.sort_by(|a, b| b.cmp(a));
        Ok(versions)
    }

    fn create_version(&self, version: &str) -> Result<(), StorageError> {
        fs::create_dir_all(self.version_dir(version))?;
        tracing::info!(version, "Created version folder");
        Ok(())
    }

    fn load_table(&self, version: &str, file_name: &str) -> Result<Table, StorageError> {
        let path = self.existing_version_dir(version)?.join(file_name);
        if !path.is_file() {
            return Err(StorageError::FileNotFound {
                version: version.to_string(),
                file: file_name.to_string(),
            });
        }
        let bytes = fs::read(&path)?;
        let table = table_from_csv(&bytes)?;
        tracing::debug!(version, file = file_name, rows = table.row_count(), "Loaded table");
        Ok(table)
    }

    fn store_table(
        &self,
        version: &str,
        file_name: &str,
        table: &Table,
    ) -> Result<(), StorageError> {
        let bytes = table_to_csv(table)?;
        self.store_artifact(version, file_name, &bytes)
    }

    fn store_artifact(
        &self,
        version: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let dir = self.existing_version_dir(version)?;
        fs::write(dir.join(file_name), bytes)?;
        tracing::debug!(version, file = file_name, size = bytes.len(), "Stored file");
        Ok(())
    }

    fn copy_version_tables(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = self.existing_version_dir(from)?;
        self.create_version(to)?;
        let target = self.version_dir(to);
        for entry in fs::read_dir(&source)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_file() && name.ends_with(".csv") {
                fs::copy(entry.path(), target.join(&name))?;
                tracing::debug!(from, to, file = %name, "Copied table file");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn store() -> (tempfile::TempDir, LocalVersionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVersionStore::new(dir.path());
        (dir, store)
    }

    fn sample_table() -> Table {
        let mut t = Table::new(vec!["ModelID".into(), "SortModels".into()]).unwrap();
        t.push_row(vec![Value::text("M1"), Value::text("1")]).unwrap();
        t
    }

    #[test]
    fn versions_list_newest_first() {
        let (_dir, store) = store();
        for v in ["V1.0", "V2.0", "V10.0"] {
            store.create_version(v).unwrap();
        }
        // plain name order, descending
        assert_eq!(store.list_versions().unwrap(), ["V2.0", "V10.0", "V1.0"]);
    }

    #[test]
    fn empty_root_lists_no_versions() {
        let (_dir, store) = store();
        assert!(store.list_versions().unwrap().is_empty());
    }

    #[test]
    fn table_round_trip() {
        let (_dir, store) = store();
        store.create_version("V1").unwrap();
        store.store_table("V1", "M_Models.csv", &sample_table()).unwrap();
        let back = store.load_table("V1", "M_Models.csv").unwrap();
        assert_eq!(back.cell(0, "ModelID"), Some(&Value::text("M1")));
    }

    #[test]
    fn missing_version_and_file_are_distinct_errors() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load_table("V9", "M_Models.csv"),
            Err(StorageError::VersionNotFound(v)) if v == "V9"
        ));
        store.create_version("V1").unwrap();
        assert!(matches!(
            store.load_table("V1", "M_Models.csv"),
            Err(StorageError::FileNotFound { .. })
        ));
    }

    #[test]
    fn copy_takes_tables_but_not_artifacts() {
        let (_dir, store) = store();
        store.create_version("master").unwrap();
        store.store_table("master", "M_Models.csv", &sample_table()).unwrap();
        store.store_artifact("master", "Elementplan_DE_master.xlsx", b"zip").unwrap();

        store.copy_version_tables("master", "master-P-007").unwrap();
        assert!(store.load_table("master-P-007", "M_Models.csv").is_ok());
        assert!(matches!(
            store.load_table("master-P-007", "Elementplan_DE_master.xlsx"),
            Err(StorageError::FileNotFound { .. })
        ));
    }
}
