//! Hash index builder.
//!
//! Walks the local tree, drops every path whose root-relative path contains
//! one of the filters (case-insensitive), and hashes the remaining files in
//! parallel into a [`Manifest`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use hostsync_core::{paths, Manifest};

use crate::error::{io_err, SyncError};
use crate::parallel::try_for_each_bounded;

/// Case-insensitive substring filters over full paths.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    needles: Vec<String>,
}

impl PathFilter {
    pub fn new<S: AsRef<str>>(filters: &[S]) -> Self {
        Self {
            needles: filters
                .iter()
                .map(|f| f.as_ref().to_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.needles.is_empty() {
            return false;
        }
        let haystack = path.to_string_lossy().to_lowercase();
        self.needles.iter().any(|n| haystack.contains(n.as_str()))
    }
}

/// SHA-256 of a file's full byte stream, lowercase hex.
pub fn hash_file(path: &Path) -> Result<String, SyncError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(|e| io_err(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Regular files under `root` that pass `filter`, sorted.
pub fn list_files(root: &Path, filter: &PathFilter) -> Result<Vec<PathBuf>, SyncError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !filter.is_excluded(relative(root, e.path())));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Directories under `root` (excluding `root` itself) that pass `filter`,
/// as manifest-style keys ordered parents first.
pub fn list_folders(root: &Path, filter: &PathFilter) -> Result<Vec<String>, SyncError> {
    let mut folders = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !filter.is_excluded(relative(root, e.path())));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_dir() {
            if let Some(key) = paths::manifest_key(root, entry.path()) {
                folders.push(key);
            }
        }
    }
    Ok(folders)
}

/// Filters see paths relative to the synced root, never the root's own
/// location.
fn relative<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Build the manifest for `root`.
pub fn build(root: &Path, filter: &PathFilter, concurrency: usize) -> Result<Manifest, SyncError> {
    let files = list_files(root, filter)?;
    let count = files.len();
    let results: Mutex<Manifest> = Mutex::new(Manifest::new());

    try_for_each_bounded(files, concurrency, |path| {
        let Some(key) = paths::manifest_key(root, &path) else {
            return Ok(());
        };
        let hash = hash_file(&path)?;
        results.lock().entry(key).or_insert(hash);
        Ok::<(), SyncError>(())
    })?;

    let manifest = results.into_inner();
    tracing::debug!(target: "local", root = %root.display(), files = count, "hashed local tree");
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn hash_is_sha256_hex() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.txt", b"abc");
        assert_eq!(
            hash_file(&tmp.path().join("a.txt")).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn build_keys_are_relative_with_forward_slashes() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "level.dat", b"1");
        write(tmp.path(), "region/r.0.0.mca", b"2");

        let manifest = build(tmp.path(), &PathFilter::default(), 4).unwrap();
        let keys: Vec<&str> = manifest.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["level.dat", "region/r.0.0.mca"]);
    }

    #[test]
    fn filters_are_case_insensitive_substrings() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "world/level.dat", b"1");
        write(tmp.path(), ".hostsync/flags.json", b"{}");
        write(tmp.path(), "OpenJDK/bin/java", b"x");
        write(tmp.path(), "logs/latest.log", b"x");

        let filter = PathFilter::new(&[".hostsync", "openjdk", "latest.LOG"]);
        let manifest = build(tmp.path(), &filter, 2).unwrap();
        let keys: Vec<&str> = manifest.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["world/level.dat"]);
    }

    #[test]
    fn identical_content_gives_identical_hash() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a", b"same");
        write(tmp.path(), "b", b"same");
        write(tmp.path(), "c", b"different");
        let manifest = build(tmp.path(), &PathFilter::default(), 3).unwrap();
        assert_eq!(manifest["a"], manifest["b"]);
        assert_ne!(manifest["a"], manifest["c"]);
    }

    #[test]
    fn folders_listed_parents_first_and_filtered() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "world/region/r.0.0.mca", b"1");
        write(tmp.path(), "world/data/x.dat", b"1");
        write(tmp.path(), "libraries/lib.jar", b"1");

        let filter = PathFilter::new(&["libraries"]);
        let folders = list_folders(tmp.path(), &filter).unwrap();
        assert_eq!(folders, vec!["world", "world/data", "world/region"]);
    }

    #[test]
    fn empty_tree_gives_empty_manifest() {
        let tmp = TempDir::new().unwrap();
        assert!(build(tmp.path(), &PathFilter::default(), 4).unwrap().is_empty());
    }
}
