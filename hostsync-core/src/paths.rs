//! Fixed file locations and path-key helpers.
//!
//! # Layout
//!
//! ```text
//! <root>/                      synchronised tree
//!   .hostsync/
//!     flags.json               local copy of the state record
//!     hashes.json              local copy of the manifest
//!
//! <remote>/
//!   .hostsync/flags.json       shared state record
//!   .hostsync/hashes.json      shared manifest
//!   …                          mirror of <root>, filters applied
//! ```

use std::path::{Component, Path, PathBuf};

/// Directory holding the tool's own files, both locally and remotely.
pub const STATE_DIR: &str = ".hostsync";
pub const FLAGS_FILE: &str = "flags.json";
pub const MANIFEST_FILE: &str = "hashes.json";

/// Remote key of the shared state record.
pub fn remote_flags_key() -> String {
    format!("{STATE_DIR}/{FLAGS_FILE}")
}

/// Remote key of the shared manifest.
pub fn remote_manifest_key() -> String {
    format!("{STATE_DIR}/{MANIFEST_FILE}")
}

/// `<root>/.hostsync/flags.json`
pub fn local_flags_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(FLAGS_FILE)
}

/// `<root>/.hostsync/hashes.json`
pub fn local_manifest_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(MANIFEST_FILE)
}

/// Manifest key for `path` below `root`: forward slashes, no leading `./`.
///
/// Returns `None` when `path` is not inside `root`.
pub fn manifest_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Whether `key` stays inside the tree it is resolved against.
///
/// Rejects empty keys, `..` segments, absolute keys and drive or UNC
/// prefixes (`C:`, `\\server`).
pub fn is_safe_key(key: &str) -> bool {
    if key.starts_with(['/', '\\']) {
        return false;
    }
    let mut any = false;
    for (index, segment) in segments(key).enumerate() {
        if segment == ".." || (index == 0 && segment.contains(':')) {
            return false;
        }
        any = true;
    }
    any
}

/// Local filesystem path for a manifest key; `None` for keys that would
/// resolve outside `root` (see [`is_safe_key`]).
pub fn key_to_path(root: &Path, key: &str) -> Option<PathBuf> {
    if !is_safe_key(key) {
        return None;
    }
    let mut path = root.to_path_buf();
    for segment in segments(key) {
        path.push(segment);
    }
    Some(path)
}

/// Non-empty `/`-separated segments of a key. Backslashes are accepted as
/// separators so manifests written on Windows hosts still resolve.
pub fn segments(key: &str) -> impl Iterator<Item = &str> {
    key.split(['/', '\\']).filter(|s| !s.is_empty() && *s != ".")
}

/// Parent key of `key` (`"a/b/c"` → `Some("a/b")`, `"c"` → `None`).
pub fn parent_key(key: &str) -> Option<String> {
    let parts: Vec<&str> = segments(key).collect();
    if parts.len() <= 1 {
        return None;
    }
    Some(parts[..parts.len() - 1].join("/"))
}

/// Last segment of `key`.
pub fn file_name(key: &str) -> Option<&str> {
    segments(key).last()
}
