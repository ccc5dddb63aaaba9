//! In-process store with the same handle semantics as the registry.
//!
//! Used on hosts without a native registry and by the test suite. Open
//! handles are tracked so callers can check that every handle was released,
//! and faults can be injected per branch.

use super::{Store, SEPARATOR};
use crate::domain::{AccessFlags, AccessMode, KeyInfo, RootKey, Variant};
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
struct Node {
    values: BTreeMap<String, Variant>,
    children: BTreeMap<String, Node>,
    last_write: DateTime<Utc>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            children: BTreeMap::new(),
            last_write: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct OpenKey {
    root: RootKey,
    path: String,
    mode: AccessMode,
}

#[derive(Debug)]
struct State {
    roots: HashMap<RootKey, Node>,
    handles: HashMap<u64, OpenKey>,
    next_handle: u64,
    total_opens: u64,
    enum_calls: u64,
    denied: HashSet<(RootKey, String)>,
    uncreatable: HashSet<(RootKey, String)>,
    broken_scans: HashMap<(RootKey, String), u32>,
    fail_close: bool,
}

impl Default for State {
    // Hive roots always exist, like their native counterparts.
    fn default() -> Self {
        Self {
            roots: RootKey::ALL.into_iter().map(|r| (r, Node::default())).collect(),
            handles: HashMap::new(),
            next_handle: 0,
            total_opens: 0,
            enum_calls: 0,
            denied: HashSet::new(),
            uncreatable: HashSet::new(),
            broken_scans: HashMap::new(),
            fail_close: false,
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

fn normalize(path: &str) -> String {
    let sep = SEPARATOR.to_string();
    segments(path).collect::<Vec<_>>().join(sep.as_str())
}

fn display(root: RootKey, path: &str) -> String {
    format!("{root}{SEPARATOR}{path}")
}

impl State {
    fn node(&self, root: RootKey, path: &str) -> Option<&Node> {
        let mut node = self.roots.get(&root)?;
        for segment in segments(path) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, root: RootKey, path: &str) -> Option<&mut Node> {
        let mut node = self.roots.get_mut(&root)?;
        for segment in segments(path) {
            node = node.children.get_mut(segment)?;
        }
        Some(node)
    }

    fn create(&mut self, root: RootKey, path: &str) {
        let mut node = self.roots.entry(root).or_default();
        for segment in segments(path) {
            node = node.children.entry(segment.to_string()).or_default();
        }
    }

    fn check_access(&self, root: RootKey, path: &str) -> Result<()> {
        if self.denied.contains(&(root, path.to_string())) {
            return Err(RegistryError::AccessDenied(display(root, path)));
        }
        Ok(())
    }

    fn check_scan(&self, open: &OpenKey, index: u32) -> Result<()> {
        match self.broken_scans.get(&(open.root, open.path.clone())) {
            Some(&at) if index >= at => Err(RegistryError::OsFailure(format!(
                "{}: enumeration failed at index {index}",
                display(open.root, &open.path)
            ))),
            _ => Ok(()),
        }
    }

    fn open_key(&self, key: &MemKey) -> Result<&OpenKey> {
        self.handles
            .get(&key.0)
            .ok_or_else(|| RegistryError::OsFailure(format!("invalid handle {}", key.0)))
    }

    fn target(&self, key: &MemKey) -> Result<(&OpenKey, &Node)> {
        let open = self.open_key(key)?;
        let node = self.node(open.root, &open.path).ok_or_else(|| {
            RegistryError::OsFailure(format!(
                "{}: branch was deleted while open",
                display(open.root, &open.path)
            ))
        })?;
        Ok((open, node))
    }
}

/// Handle to a branch opened in a [`MemoryStore`].
#[derive(Debug)]
pub struct MemKey(u64);

/// A shared, in-memory hierarchical store. Clones refer to the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently open.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.state.read().handles.len()
    }

    /// Number of successful opens since creation.
    #[must_use]
    pub fn total_opens(&self) -> u64 {
        self.state.read().total_opens
    }

    /// Make every open or delete of exactly this branch fail with `AccessDenied`.
    pub fn deny(&self, root: RootKey, path: &str) {
        self.state.write().denied.insert((root, normalize(path)));
    }

    /// Number of `enum_key`/`enum_value` queries since creation.
    #[must_use]
    pub fn enum_calls(&self) -> u64 {
        self.state.read().enum_calls
    }

    /// Make a create-mode open of exactly this branch fail with `NotFound`
    /// when it does not exist yet. Existing branches still open.
    pub fn forbid_create(&self, root: RootKey, path: &str) {
        self.state.write().uncreatable.insert((root, normalize(path)));
    }

    /// Make enumeration of this branch fail from `index` onwards.
    pub fn break_scan_at(&self, root: RootKey, path: &str, index: u32) {
        self.state
            .write()
            .broken_scans
            .insert((root, normalize(path)), index);
    }

    /// Report an error from every close. Handles are still released.
    pub fn fail_close(&self, fail: bool) {
        self.state.write().fail_close = fail;
    }
}

impl Store for MemoryStore {
    type Key = MemKey;

    fn open(
        &self,
        root: RootKey,
        path: &str,
        mode: AccessMode,
        flags: AccessFlags,
    ) -> Result<MemKey> {
        let path = normalize(path);
        let mut state = self.state.write();
        state.check_access(root, &path)?;

        match mode {
            AccessMode::Read => {
                if state.node(root, &path).is_none() {
                    return Err(RegistryError::NotFound(display(root, &path)));
                }
            }
            AccessMode::Create => {
                if state.node(root, &path).is_none() {
                    if state.uncreatable.contains(&(root, path.clone())) {
                        return Err(RegistryError::NotFound(format!(
                            "{}: cannot be created",
                            display(root, &path)
                        )));
                    }
                    state.create(root, &path);
                }
            }
        }

        let id = state.next_handle;
        state.next_handle += 1;
        state.total_opens += 1;
        trace!(%root, path = %path, mode = mode.as_str(), flags = flags.bits(), handle = id, "open");
        state.handles.insert(id, OpenKey { root, path, mode });
        Ok(MemKey(id))
    }

    fn close(&self, key: MemKey) -> Result<()> {
        let mut state = self.state.write();
        if state.handles.remove(&key.0).is_none() {
            return Err(RegistryError::OsFailure(format!("invalid handle {}", key.0)));
        }
        trace!(handle = key.0, "close");
        if state.fail_close {
            return Err(RegistryError::OsFailure(format!("close failed for handle {}", key.0)));
        }
        Ok(())
    }

    fn enum_key(&self, key: &MemKey, index: u32) -> Result<Option<String>> {
        self.state.write().enum_calls += 1;
        let state = self.state.read();
        let (open, node) = state.target(key)?;
        state.check_scan(open, index)?;
        Ok(node.children.keys().nth(index as usize).cloned())
    }

    fn enum_value(&self, key: &MemKey, index: u32) -> Result<Option<(String, Variant)>> {
        self.state.write().enum_calls += 1;
        let state = self.state.read();
        let (open, node) = state.target(key)?;
        state.check_scan(open, index)?;
        Ok(node
            .values
            .iter()
            .nth(index as usize)
            .map(|(name, value)| (name.clone(), value.clone())))
    }

    fn query_value(&self, key: &MemKey, name: &str) -> Result<Option<Variant>> {
        let state = self.state.read();
        let (_, node) = state.target(key)?;
        Ok(node.values.get(name).cloned())
    }

    fn set_value(&self, key: &MemKey, name: &str, value: &Variant) -> Result<()> {
        let mut state = self.state.write();
        let open = state.open_key(key)?;
        if open.mode == AccessMode::Read {
            return Err(RegistryError::AccessDenied(format!(
                "{}: handle opened read-only",
                display(open.root, &open.path)
            )));
        }
        let (root, path) = (open.root, open.path.clone());
        let node = state.node_mut(root, &path).ok_or_else(|| {
            RegistryError::OsFailure(format!("{}: branch was deleted while open", display(root, &path)))
        })?;
        node.values.insert(name.to_string(), value.clone());
        node.last_write = Utc::now();
        Ok(())
    }

    fn delete_key(&self, root: RootKey, path: &str, _flags: AccessFlags) -> Result<()> {
        let path = normalize(path);
        let mut state = self.state.write();
        state.check_access(root, &path)?;

        let (parent, name) = match path.rsplit_once(SEPARATOR) {
            Some((parent, name)) => (parent.to_string(), name.to_string()),
            None => (String::new(), path.clone()),
        };
        if name.is_empty() {
            return Err(RegistryError::AccessDenied(format!("{root}: cannot delete a root")));
        }

        let parent_node = state
            .node_mut(root, &parent)
            .ok_or_else(|| RegistryError::NotFound(display(root, &path)))?;
        let has_children = match parent_node.children.get(&name) {
            None => return Err(RegistryError::NotFound(display(root, &path))),
            Some(node) => !node.children.is_empty(),
        };
        if has_children {
            return Err(RegistryError::OsFailure(format!(
                "{}: branch still has subkeys",
                display(root, &path)
            )));
        }

        parent_node.children.remove(&name);
        parent_node.last_write = Utc::now();
        trace!(%root, path = %path, "delete");
        Ok(())
    }

    fn query_info(&self, key: &MemKey) -> Result<KeyInfo> {
        let state = self.state.read();
        let (_, node) = state.target(key)?;
        Ok(KeyInfo {
            subkeys: node.children.len(),
            values: node.values.len(),
            last_write: Some(node.last_write),
        })
    }
}
