//! File-level operations over a [`SessionPool`].
//!
//! Each operation checks out one session, does all of its lookups and
//! transfers on it, and counts bytes into [`TransferStats`].

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use hostsync_core::paths;

use crate::error::{io_err, StoreError};
use crate::path::{create_folder_all, resolve_id};
use crate::pool::SessionPool;
use crate::progress::{record_transfer, CountingReader, CountingWriter, Direction, TransferStats};
use crate::store::{ObjectId, ObjectStore, SessionFactory};

/// Result of [`RemoteFiles::upload_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded(ObjectId),
    AlreadyPresent(ObjectId),
}

pub struct RemoteFiles<F: SessionFactory> {
    pool: SessionPool<F>,
    stats: TransferStats,
}

impl<F: SessionFactory> RemoteFiles<F> {
    pub fn new(pool: SessionPool<F>) -> Self {
        Self {
            pool,
            stats: TransferStats::new(),
        }
    }

    pub fn pool(&self) -> &SessionPool<F> {
        &self.pool
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.pool
            .with_session(|s| Ok(resolve_id(s, key)?.is_some()))
    }

    /// Download `key` to `dest`, replacing it atomically.
    ///
    /// Returns `false` without touching `dest` when `key` does not exist.
    pub fn download(&self, key: &str, dest: &Path) -> Result<bool, StoreError> {
        self.pool.with_session(|s| {
            let Some(id) = resolve_id(s, key)? else {
                return Ok(false);
            };
            if let Some(dir) = dest.parent() {
                fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            }
            let tmp = tmp_path(dest);
            let result = self.fetch_into(s, &id, &tmp).and_then(|bytes| {
                fs::rename(&tmp, dest).map_err(|e| io_err(dest, e))?;
                Ok(bytes)
            });
            let bytes = match result {
                Ok(bytes) => bytes,
                Err(err) => {
                    let _ = fs::remove_file(&tmp);
                    return Err(err);
                }
            };
            record_transfer(&self.stats, Direction::Download, bytes);
            tracing::debug!(target: "transfer", key, bytes, "downloaded");
            Ok(true)
        })
    }

    /// Upload `local` to `key`, creating missing parent folders. Does not
    /// check for an existing object of the same name.
    pub fn upload(&self, local: &Path, key: &str) -> Result<ObjectId, StoreError> {
        self.pool.with_session(|s| self.put_file(s, local, key))
    }

    /// Upload `local` to `key` unless an object already exists there.
    pub fn upload_if_absent(&self, local: &Path, key: &str) -> Result<UploadOutcome, StoreError> {
        self.pool.with_session(|s| {
            if let Some(id) = resolve_id(s, key)? {
                return Ok(UploadOutcome::AlreadyPresent(id));
            }
            self.put_file(s, local, key).map(UploadOutcome::Uploaded)
        })
    }

    /// Replace the object at `key` with `local`.
    pub fn overwrite(&self, local: &Path, key: &str) -> Result<ObjectId, StoreError> {
        self.pool.with_session(|s| {
            if let Some(id) = resolve_id(s, key)? {
                s.delete(&id)?;
            }
            self.put_file(s, local, key)
        })
    }

    /// Delete the object (file or folder) at `key`.
    ///
    /// Returns `false` when nothing was there.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.pool.with_session(|s| match resolve_id(s, key)? {
            Some(id) => {
                s.delete(&id)?;
                Ok(true)
            }
            None => Ok(false),
        })
    }

    /// Ensure the folder `key` exists; returns whether it had to be created.
    pub fn create_folder(&self, key: &str) -> Result<bool, StoreError> {
        self.pool
            .with_session(|s| Ok(create_folder_all(s, key)?.created))
    }

    fn fetch_into(&self, s: &F::Session, id: &ObjectId, tmp: &Path) -> Result<u64, StoreError> {
        let file = fs::File::create(tmp).map_err(|e| io_err(tmp, e))?;
        let mut writer = CountingWriter::new(BufWriter::new(file));
        s.get(id, &mut writer)?;
        let bytes = writer.count();
        let mut inner = writer.into_inner();
        inner.flush().map_err(|e| io_err(tmp, e))?;
        let file = inner.into_inner().map_err(|e| io_err(tmp, e.into_error()))?;
        file.sync_all().map_err(|e| io_err(tmp, e))?;
        Ok(bytes)
    }

    fn put_file(&self, s: &F::Session, local: &Path, key: &str) -> Result<ObjectId, StoreError> {
        let name = paths::file_name(key).ok_or_else(|| StoreError::NotFound {
            path: key.to_string(),
        })?;
        let parent = match paths::parent_key(key) {
            Some(parent_key) => create_folder_all(s, &parent_key)?.id,
            None => None,
        };
        let file = fs::File::open(local).map_err(|e| io_err(local, e))?;
        let mut reader = CountingReader::new(BufReader::new(file));
        let id = s.put(parent.as_ref(), name, &mut reader)?;
        record_transfer(&self.stats, Direction::Upload, reader.count());
        tracing::debug!(target: "transfer", key, bytes = reader.count(), "uploaded");
        Ok(id)
    }
}

fn tmp_path(dest: &Path) -> PathBuf {
    PathBuf::from(format!("{}.hostsync.tmp", dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::StoreOp;
    use std::time::Duration;
    use tempfile::TempDir;

    fn remote(store: &MemoryStore) -> RemoteFiles<MemoryStore> {
        RemoteFiles::new(SessionPool::new(store.clone(), Duration::from_secs(3600)))
    }

    #[test]
    fn download_writes_file_and_counts_bytes() {
        let store = MemoryStore::new();
        store.insert_file("world/level.dat", &[1u8; 20_000]);
        let files = remote(&store);
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("world/level.dat");

        assert!(files.download("world/level.dat", &dest).unwrap());
        assert_eq!(fs::read(&dest).unwrap().len(), 20_000);
        assert_eq!(files.stats().bytes(Direction::Download), 20_000);
        assert!(!tmp.path().join("world/level.dat.hostsync.tmp").exists());
    }

    #[test]
    fn download_missing_key_returns_false() {
        let store = MemoryStore::new();
        let files = remote(&store);
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("nope");
        assert!(!files.download("nope", &dest).unwrap());
        assert!(!dest.exists());
    }

    #[test]
    fn failed_download_keeps_previous_file() {
        let store = MemoryStore::new();
        store.insert_file("a.txt", b"remote");
        store.fail_next(StoreOp::Get, 1);
        let files = remote(&store);
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("a.txt");
        fs::write(&dest, b"local").unwrap();

        assert!(files.download("a.txt", &dest).is_err());
        assert_eq!(fs::read(&dest).unwrap(), b"local");
        assert!(!tmp.path().join("a.txt.hostsync.tmp").exists());
    }

    #[test]
    fn upload_creates_parent_folders() {
        let store = MemoryStore::new();
        let files = remote(&store);
        let tmp = TempDir::new().unwrap();
        let local = tmp.path().join("r.0.0.mca");
        fs::write(&local, b"chunk").unwrap();

        files.upload(&local, "world/region/r.0.0.mca").unwrap();
        assert!(store.is_folder("world/region"));
        assert_eq!(store.read_file("world/region/r.0.0.mca").unwrap(), b"chunk");
        assert_eq!(files.stats().bytes(Direction::Upload), 5);
    }

    #[test]
    fn failed_attempts_are_not_counted() {
        let store = MemoryStore::new();
        store.insert_file("a.txt", b"remote");
        store.fail_next(StoreOp::Put, 1);
        let files = remote(&store);
        let tmp = TempDir::new().unwrap();
        let local = tmp.path().join("b.txt");
        fs::write(&local, b"12345").unwrap();

        assert!(files.upload(&local, "b.txt").is_err());
        assert_eq!(files.stats().bytes(Direction::Upload), 0);
        files.upload(&local, "b.txt").unwrap();
        assert_eq!(files.stats().bytes(Direction::Upload), 5);

        let blocked = tmp.path().join("dir");
        fs::create_dir(&blocked).unwrap();
        assert!(matches!(
            files.download("a.txt", &blocked),
            Err(StoreError::Io { .. })
        ));
        assert_eq!(files.stats().bytes(Direction::Download), 0);
        assert!(!tmp.path().join("dir.hostsync.tmp").exists());
    }

    #[test]
    fn upload_if_absent_skips_existing() {
        let store = MemoryStore::new();
        store.insert_file("a.txt", b"first");
        let files = remote(&store);
        let tmp = TempDir::new().unwrap();
        let local = tmp.path().join("a.txt");
        fs::write(&local, b"second").unwrap();

        let outcome = files.upload_if_absent(&local, "a.txt").unwrap();
        assert!(matches!(outcome, UploadOutcome::AlreadyPresent(_)));
        assert_eq!(store.count_named("a.txt"), 1);
        assert_eq!(store.calls(StoreOp::Put), 0);
    }

    #[test]
    fn overwrite_leaves_single_copy() {
        let store = MemoryStore::new();
        store.insert_file(".hostsync/flags.json", b"{}");
        let files = remote(&store);
        let tmp = TempDir::new().unwrap();
        let local = tmp.path().join("flags.json");
        fs::write(&local, br#"{"owner":"m1"}"#).unwrap();

        files.overwrite(&local, ".hostsync/flags.json").unwrap();
        assert_eq!(store.count_named(".hostsync/flags.json"), 1);
        assert_eq!(
            store.read_file(".hostsync/flags.json").unwrap(),
            br#"{"owner":"m1"}"#
        );
    }

    #[test]
    fn delete_missing_is_noop() {
        let store = MemoryStore::new();
        let files = remote(&store);
        assert!(!files.delete("ghost.txt").unwrap());
        assert_eq!(store.calls(StoreOp::Delete), 0);
    }

    #[test]
    fn create_folder_reports_creation_once() {
        let store = MemoryStore::new();
        let files = remote(&store);
        assert!(files.create_folder("a/b").unwrap());
        assert!(!files.create_folder("a/b").unwrap());
    }
}
