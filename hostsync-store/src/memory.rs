//! In-memory object store.
//!
//! Behaves like a remote drive: ids are opaque, names are not unique
//! within a folder (a second `put` of the same name creates a sibling),
//! and `find_child` returns the oldest match. Supports fault injection and
//! per-operation call counters.

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};
use std::sync::Arc;

use hostsync_core::paths;
use parking_lot::Mutex;

use crate::error::{io_err, transfer_err, StoreError};
use crate::store::{ObjectId, ObjectStore, SessionFactory, StoreOp};

#[derive(Debug, Clone)]
enum Content {
    Folder,
    File(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<u64>,
    content: Content,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    nodes: BTreeMap<u64, Node>,
    calls: HashMap<StoreOp, u64>,
    pending_failures: HashMap<StoreOp, u32>,
    connects: u64,
    pending_rejections: u32,
    credential_resets: u64,
}

impl State {
    fn insert(&mut self, parent: Option<u64>, name: &str, content: Content) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.nodes.insert(
            id,
            Node {
                name: name.to_string(),
                parent,
                content,
            },
        );
        id
    }

    fn child(&self, parent: Option<u64>, name: &str) -> Option<u64> {
        self.nodes
            .iter()
            .find(|(_, n)| n.parent == parent && n.name == name)
            .map(|(id, _)| *id)
    }

    fn children_named(&self, parent: Option<u64>, name: &str) -> usize {
        self.nodes
            .values()
            .filter(|n| n.parent == parent && n.name == name)
            .count()
    }

    fn lookup(&self, key: &str) -> Option<u64> {
        let mut current = None;
        for segment in paths::segments(key) {
            current = Some(self.child(current, segment)?);
        }
        current
    }

    fn remove_tree(&mut self, id: u64) {
        let children: Vec<u64> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(id))
            .map(|(child, _)| *child)
            .collect();
        for child in children {
            self.remove_tree(child);
        }
        self.nodes.remove(&id);
    }

    fn key_of(&self, id: u64) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get(&c)) {
            parts.push(node.name.clone());
            current = node.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Count the call and consume one injected failure, if any.
    fn enter(&mut self, op: StoreOp, path: &str) -> Result<(), StoreError> {
        *self.calls.entry(op).or_default() += 1;
        if let Some(remaining) = self.pending_failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(transfer_err(op, path, "injected failure"));
            }
        }
        Ok(())
    }
}

/// Shared handle; clones see the same objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a file at `key`, creating missing folders. Not counted.
    pub fn insert_file(&self, key: &str, content: &[u8]) {
        let mut state = self.state.lock();
        let parts: Vec<&str> = paths::segments(key).collect();
        let Some((name, folders)) = parts.split_last() else {
            return;
        };
        let mut parent = None;
        for folder in folders {
            parent = Some(match state.child(parent, folder) {
                Some(id) => id,
                None => state.insert(parent, folder, Content::Folder),
            });
        }
        state.insert(parent, name, Content::File(content.to_vec()));
    }

    /// Content of the file at `key`.
    pub fn read_file(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.state.lock();
        let id = state.lookup(key)?;
        match &state.nodes.get(&id)?.content {
            Content::File(bytes) => Some(bytes.clone()),
            Content::Folder => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().lookup(key).is_some()
    }

    pub fn is_folder(&self, key: &str) -> bool {
        let state = self.state.lock();
        state
            .lookup(key)
            .and_then(|id| state.nodes.get(&id))
            .is_some_and(|n| matches!(n.content, Content::Folder))
    }

    /// Number of objects called like the last segment of `key` in its
    /// parent folder. More than one means a duplicate upload.
    pub fn count_named(&self, key: &str) -> usize {
        let state = self.state.lock();
        let Some(name) = paths::file_name(key) else {
            return 0;
        };
        let parent = match paths::parent_key(key) {
            Some(parent_key) => match state.lookup(&parent_key) {
                Some(id) => Some(id),
                None => return 0,
            },
            None => None,
        };
        state.children_named(parent, name)
    }

    /// Keys of every file, sorted.
    pub fn file_keys(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut keys: Vec<String> = state
            .nodes
            .iter()
            .filter(|(_, n)| matches!(n.content, Content::File(_)))
            .map(|(id, _)| state.key_of(*id))
            .collect();
        keys.sort();
        keys
    }

    /// Make the next `count` calls of `op` fail with a transfer error.
    pub fn fail_next(&self, op: StoreOp, count: u32) {
        *self.state.lock().pending_failures.entry(op).or_default() += count;
    }

    /// Make the next `count` connects fail with an authentication error.
    pub fn reject_next_connects(&self, count: u32) {
        self.state.lock().pending_rejections += count;
    }

    pub fn calls(&self, op: StoreOp) -> u64 {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn connects(&self) -> u64 {
        self.state.lock().connects
    }

    pub fn credential_resets(&self) -> u64 {
        self.state.lock().credential_resets
    }
}

/// One connected session on a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryStore,
    serial: u64,
}

impl MemorySession {
    /// Connect sequence number of this session.
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl SessionFactory for MemoryStore {
    type Session = MemorySession;

    fn connect(&self) -> Result<MemorySession, StoreError> {
        let mut state = self.state.lock();
        if state.pending_rejections > 0 {
            state.pending_rejections -= 1;
            return Err(StoreError::Authentication {
                reason: "token rejected".into(),
            });
        }
        state.connects += 1;
        Ok(MemorySession {
            store: self.clone(),
            serial: state.connects,
        })
    }

    fn reset_credentials(&self) -> Result<(), StoreError> {
        self.state.lock().credential_resets += 1;
        Ok(())
    }
}

fn parse_id(id: &ObjectId) -> Option<u64> {
    id.0.strip_prefix("mem-")?.parse().ok()
}

fn to_id(raw: u64) -> ObjectId {
    ObjectId(format!("mem-{raw}"))
}

/// Parent id as stored; unknown ids are reported as not found.
fn parent_of(state: &State, parent: Option<&ObjectId>) -> Result<Option<u64>, StoreError> {
    match parent {
        None => Ok(None),
        Some(id) => match parse_id(id).filter(|raw| state.nodes.contains_key(raw)) {
            Some(raw) => Ok(Some(raw)),
            None => Err(StoreError::NotFound { path: id.0.clone() }),
        },
    }
}

impl ObjectStore for MemorySession {
    fn find_child(
        &self,
        parent: Option<&ObjectId>,
        name: &str,
    ) -> Result<Option<ObjectId>, StoreError> {
        let mut state = self.store.state.lock();
        state.enter(StoreOp::FindChild, name)?;
        let parent = parent_of(&state, parent)?;
        Ok(state.child(parent, name).map(to_id))
    }

    fn create_folder(&self, parent: Option<&ObjectId>, name: &str) -> Result<ObjectId, StoreError> {
        let mut state = self.store.state.lock();
        state.enter(StoreOp::CreateFolder, name)?;
        let parent = parent_of(&state, parent)?;
        Ok(to_id(state.insert(parent, name, Content::Folder)))
    }

    fn get(&self, id: &ObjectId, sink: &mut dyn Write) -> Result<u64, StoreError> {
        let bytes = {
            let mut state = self.store.state.lock();
            state.enter(StoreOp::Get, &id.0)?;
            let node = parse_id(id).and_then(|raw| state.nodes.get(&raw));
            match node.map(|n| &n.content) {
                Some(Content::File(bytes)) => bytes.clone(),
                _ => return Err(StoreError::NotFound { path: id.0.clone() }),
            }
        };
        sink.write_all(&bytes).map_err(|e| io_err(&id.0, e))?;
        Ok(bytes.len() as u64)
    }

    fn put(
        &self,
        parent: Option<&ObjectId>,
        name: &str,
        source: &mut dyn Read,
    ) -> Result<ObjectId, StoreError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes).map_err(|e| io_err(name, e))?;
        let mut state = self.store.state.lock();
        state.enter(StoreOp::Put, name)?;
        let parent = parent_of(&state, parent)?;
        Ok(to_id(state.insert(parent, name, Content::File(bytes))))
    }

    fn delete(&self, id: &ObjectId) -> Result<(), StoreError> {
        let mut state = self.store.state.lock();
        state.enter(StoreOp::Delete, &id.0)?;
        match parse_id(id).filter(|raw| state.nodes.contains_key(raw)) {
            Some(raw) => {
                state.remove_tree(raw);
                Ok(())
            }
            None => Err(StoreError::NotFound { path: id.0.clone() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_read() {
        let store = MemoryStore::new();
        store.insert_file("a/b/c.txt", b"hello");
        assert_eq!(store.read_file("a/b/c.txt").unwrap(), b"hello");
        assert!(store.is_folder("a/b"));
        assert_eq!(store.file_keys(), vec!["a/b/c.txt".to_string()]);
    }

    #[test]
    fn put_same_name_creates_duplicate() {
        let store = MemoryStore::new();
        let session = store.connect().unwrap();
        session.put(None, "x.bin", &mut &b"1"[..]).unwrap();
        session.put(None, "x.bin", &mut &b"2"[..]).unwrap();
        assert_eq!(store.count_named("x.bin"), 2);
        assert_eq!(store.read_file("x.bin").unwrap(), b"1");
    }

    #[test]
    fn delete_folder_removes_subtree() {
        let store = MemoryStore::new();
        store.insert_file("a/b/c.txt", b"x");
        store.insert_file("keep.txt", b"y");
        let session = store.connect().unwrap();
        let id = session.find_child(None, "a").unwrap().unwrap();
        session.delete(&id).unwrap();
        assert_eq!(store.file_keys(), vec!["keep.txt".to_string()]);
    }

    #[test]
    fn injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::Get, 1);
        store.insert_file("f", b"data");
        let session = store.connect().unwrap();
        let id = session.find_child(None, "f").unwrap().unwrap();

        let mut sink = Vec::new();
        assert!(session.get(&id, &mut sink).is_err());
        assert_eq!(session.get(&id, &mut sink).unwrap(), 4);
        assert_eq!(store.calls(StoreOp::Get), 2);
    }
}
