//! Directory-backed object store.
//!
//! Serves a mounted share (or any local directory) through the object
//! store interface. Ids are root-relative keys, so names are unique per
//! folder and `put` replaces an existing file of the same name.
//!
//! Failures on the share are reported as [`StoreError::Transfer`]; failures
//! of the caller's reader or writer as [`StoreError::Io`].

use std::fs;
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use hostsync_core::paths;

use crate::error::{io_err, transfer_err, StoreError};
use crate::store::{ObjectId, ObjectStore, SessionFactory, StoreOp};

#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn child_key(parent: Option<&ObjectId>, name: &str) -> String {
        match parent {
            Some(id) if !id.0.is_empty() => format!("{}/{name}", id.0),
            _ => name.to_string(),
        }
    }

    fn path_of(&self, key: &str) -> Result<PathBuf, StoreError> {
        paths::key_to_path(&self.root, key).ok_or_else(|| StoreError::InvalidKey {
            key: key.to_string(),
        })
    }

    fn existing_dir(&self, parent: Option<&ObjectId>) -> Result<PathBuf, StoreError> {
        let path = match parent {
            Some(id) => self.path_of(&id.0)?,
            None => self.root.clone(),
        };
        if path.is_dir() {
            Ok(path)
        } else {
            Err(StoreError::NotFound {
                path: parent.map(|id| id.0.clone()).unwrap_or_default(),
            })
        }
    }
}

/// A single plain name; separators and `.`/`..` would address another
/// folder than `parent`.
fn check_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StoreError::InvalidKey {
            key: name.to_string(),
        });
    }
    Ok(())
}

/// Copy `source` into `sink`, attributing read and write failures
/// separately.
fn pump(
    source: &mut dyn Read,
    sink: &mut dyn Write,
    on_read: impl Fn(io::Error) -> StoreError,
    on_write: impl Fn(io::Error) -> StoreError,
) -> Result<u64, StoreError> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(on_read(e)),
        };
        sink.write_all(&buf[..n]).map_err(&on_write)?;
        total += n as u64;
    }
}

impl SessionFactory for DirStore {
    type Session = DirStore;

    fn connect(&self) -> Result<DirStore, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::Authentication {
                reason: format!("store root {} is not an accessible directory", self.root.display()),
            });
        }
        Ok(self.clone())
    }
}

impl ObjectStore for DirStore {
    fn find_child(
        &self,
        parent: Option<&ObjectId>,
        name: &str,
    ) -> Result<Option<ObjectId>, StoreError> {
        if check_name(name).is_err() {
            return Ok(None);
        }
        self.existing_dir(parent)?;
        let key = Self::child_key(parent, name);
        let path = self.path_of(&key)?;
        match fs::symlink_metadata(&path) {
            Ok(_) => Ok(Some(ObjectId(key))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(transfer_err(StoreOp::FindChild, key, e)),
        }
    }

    fn create_folder(&self, parent: Option<&ObjectId>, name: &str) -> Result<ObjectId, StoreError> {
        check_name(name)?;
        self.existing_dir(parent)?;
        let key = Self::child_key(parent, name);
        let path = self.path_of(&key)?;
        fs::create_dir_all(&path).map_err(|e| transfer_err(StoreOp::CreateFolder, &key, e))?;
        Ok(ObjectId(key))
    }

    fn get(&self, id: &ObjectId, sink: &mut dyn Write) -> Result<u64, StoreError> {
        let path = self.path_of(&id.0)?;
        let mut file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound { path: id.0.clone() })
            }
            Err(e) => return Err(transfer_err(StoreOp::Get, &id.0, e)),
        };
        pump(
            &mut file,
            sink,
            |e| transfer_err(StoreOp::Get, &id.0, e),
            |e| io_err(&id.0, e),
        )
    }

    fn put(
        &self,
        parent: Option<&ObjectId>,
        name: &str,
        source: &mut dyn Read,
    ) -> Result<ObjectId, StoreError> {
        check_name(name)?;
        let dir = self.existing_dir(parent)?;
        let key = Self::child_key(parent, name);
        let path = self.path_of(&key)?;
        let tmp = dir.join(format!("{name}.hostsync.tmp"));

        let result = (|| {
            let mut file =
                fs::File::create(&tmp).map_err(|e| transfer_err(StoreOp::Put, &key, e))?;
            pump(
                source,
                &mut file,
                |e| io_err(name, e),
                |e| transfer_err(StoreOp::Put, &key, e),
            )?;
            file.sync_all().map_err(|e| transfer_err(StoreOp::Put, &key, e))?;
            drop(file);
            fs::rename(&tmp, &path).map_err(|e| transfer_err(StoreOp::Put, &key, e))
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result?;
        Ok(ObjectId(key))
    }

    fn delete(&self, id: &ObjectId) -> Result<(), StoreError> {
        let path = self.path_of(&id.0)?;
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound { path: id.0.clone() })
            }
            Err(e) => return Err(transfer_err(StoreOp::Delete, &id.0, e)),
        };
        let result = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| transfer_err(StoreOp::Delete, &id.0, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{create_folder_all, resolve_id};
    use tempfile::TempDir;

    #[test]
    fn connect_requires_existing_root() {
        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path().join("absent"));
        assert!(matches!(
            store.connect(),
            Err(StoreError::Authentication { .. })
        ));
    }

    #[test]
    fn put_get_delete() {
        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path()).connect().unwrap();

        let folder = create_folder_all(&store, "world/region").unwrap();
        let id = store
            .put(folder.id.as_ref(), "r.0.0.mca", &mut &b"chunk"[..])
            .unwrap();
        assert_eq!(id, ObjectId("world/region/r.0.0.mca".into()));
        assert!(!tmp.path().join("world/region/r.0.0.mca.hostsync.tmp").exists());

        let mut sink = Vec::new();
        assert_eq!(store.get(&id, &mut sink).unwrap(), 5);
        assert_eq!(sink, b"chunk");

        store.delete(&id).unwrap();
        assert_eq!(resolve_id(&store, "world/region/r.0.0.mca").unwrap(), None);
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn put_replaces_existing_file() {
        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path()).connect().unwrap();
        store.put(None, "a.txt", &mut &b"old"[..]).unwrap();
        store.put(None, "a.txt", &mut &b"new"[..]).unwrap();
        assert_eq!(fs::read(tmp.path().join("a.txt")).unwrap(), b"new");
    }

    #[test]
    fn keys_outside_root_are_refused() {
        let tmp = TempDir::new().unwrap();
        let share = tmp.path().join("share");
        fs::create_dir(&share).unwrap();
        fs::write(tmp.path().join("outside.txt"), b"keep").unwrap();
        let store = DirStore::new(&share).connect().unwrap();

        assert_eq!(store.find_child(None, "..").unwrap(), None);
        assert!(matches!(
            store.put(None, "..", &mut &b"x"[..]),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.delete(&ObjectId("../outside.txt".into())),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.create_folder(None, "a/b"),
            Err(StoreError::InvalidKey { .. })
        ));
        assert_eq!(fs::read(tmp.path().join("outside.txt")).unwrap(), b"keep");
    }

    #[test]
    fn unreadable_source_is_a_local_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk gone"))
            }
        }

        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path()).connect().unwrap();
        let err = store.put(None, "a.txt", &mut Broken).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!tmp.path().join("a.txt").exists());
        assert!(!tmp.path().join("a.txt.hostsync.tmp").exists());
    }

    #[test]
    fn find_child_under_missing_parent_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = DirStore::new(tmp.path()).connect().unwrap();
        let ghost = ObjectId("ghost".into());
        assert!(matches!(
            store.find_child(Some(&ghost), "x"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
