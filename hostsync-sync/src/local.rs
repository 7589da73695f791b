//! Local JSON documents (`flags.json`, `hashes.json`).
//!
//! Writes use the `.tmp` sibling + rename pattern so a crash mid-write
//! never leaves a truncated document behind.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use hostsync_core::Manifest;

use crate::error::{io_err, json_err, SyncError};

/// Load a JSON document; `None` if the file does not exist.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SyncError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| json_err(path, e))
}

/// Save a JSON document atomically, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SyncError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| json_err(path, e))?;
    write_atomic(path, json.as_bytes())
}

/// Write `{}` to `path`.
pub fn write_empty(path: &Path) -> Result<(), SyncError> {
    write_atomic(path, b"{}")?;
    tracing::info!(target: "local", path = %path.display(), "created empty document");
    Ok(())
}

pub fn load_manifest(path: &Path) -> Result<Manifest, SyncError> {
    Ok(load_json(path)?.unwrap_or_default())
}

pub fn save_manifest(path: &Path, manifest: &Manifest) -> Result<(), SyncError> {
    save_json(path, manifest)
}

/// Delete a local file; a missing file is not an error.
pub fn remove_if_exists(path: &Path) -> Result<bool, SyncError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(path, err)),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("path has no parent")));
    };
    fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostsync_core::{LifecycleStatus, MachineId, StateRecord};
    use tempfile::TempDir;

    #[test]
    fn missing_document_is_none() {
        let tmp = TempDir::new().unwrap();
        let loaded: Option<StateRecord> = load_json(&tmp.path().join("flags.json")).unwrap();
        assert!(loaded.is_none());
        assert!(load_manifest(&tmp.path().join("hashes.json")).unwrap().is_empty());
    }

    #[test]
    fn save_creates_parents_and_cleans_tmp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".hostsync").join("flags.json");
        let record = StateRecord::claimed(MachineId::from("m1"), LifecycleStatus::Running);

        save_json(&path, &record).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        let loaded: StateRecord = load_json(&path).unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn empty_document_parses_as_virgin_record() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("flags.json");
        write_empty(&path).unwrap();
        let record: StateRecord = load_json(&path).unwrap().unwrap();
        assert!(record.is_virgin());
    }

    #[test]
    fn corrupt_json_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hashes.json");
        fs::write(&path, b"{ not json").unwrap();
        let err = load_manifest(&path).unwrap_err();
        assert!(matches!(err, SyncError::Json { .. }));
        assert!(err.to_string().contains("hashes.json"));
    }

    #[test]
    fn remove_missing_file_is_ok() {
        let tmp = TempDir::new().unwrap();
        assert!(!remove_if_exists(&tmp.path().join("ghost")).unwrap());
    }
}
