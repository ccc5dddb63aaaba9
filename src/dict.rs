//! Dictionary-shaped access to one registry branch.
//!
//! A [`RegistryDict`] is only a descriptor: (store, root, branch, flags).
//! Every method opens its own [`ScopedHandle`], does its work and releases
//! the handle before returning, so nothing stays open between calls.

use crate::domain::{AccessFlags, AccessMode, KeyInfo, RootKey, ValueKind, Variant};
use crate::error::{RegistryError, Result};
use crate::handle::ScopedHandle;
use crate::repositories::{join, Store, SEPARATOR};
use std::fmt;
use tracing::{debug, instrument, warn};

/// Collect entries at index 0, 1, 2, ... until the store reports end-of-range.
///
/// Any other failure aborts the scan and is returned.
fn scan<T>(mut at: impl FnMut(u32) -> Result<Option<T>>) -> Result<Vec<T>> {
    let mut entries = Vec::new();
    for index in 0..=u32::MAX {
        match at(index)? {
            Some(entry) => entries.push(entry),
            None => break,
        }
    }
    Ok(entries)
}

#[derive(Debug, Clone)]
pub struct RegistryDict<S: Store> {
    store: S,
    root: RootKey,
    branch: String,
    flags: AccessFlags,
}

#[cfg(windows)]
impl RegistryDict<crate::repositories::WinRegistry> {
    /// Descriptor for a branch of the live registry.
    pub fn new(root: RootKey, branch: impl Into<String>) -> Self {
        Self::with_store(crate::repositories::WinRegistry, root, branch)
    }
}

impl<S: Store + Clone> RegistryDict<S> {
    pub fn with_store(store: S, root: RootKey, branch: impl Into<String>) -> Self {
        Self::with_flags(store, root, branch, AccessFlags::NONE)
    }

    pub fn with_flags(
        store: S,
        root: RootKey,
        branch: impl Into<String>,
        flags: AccessFlags,
    ) -> Self {
        Self {
            store,
            root,
            branch: branch.into(),
            flags,
        }
    }

    /// Descriptor that reads and writes the 32-bit registry view.
    pub fn wow64_32(store: S, root: RootKey, branch: impl Into<String>) -> Self {
        Self::with_flags(store, root, branch, AccessFlags::WOW64_32KEY)
    }

    /// Like [`RegistryDict::with_store`], resolving the root by name.
    ///
    /// # Errors
    ///
    /// `UnknownRoot` if `root` is not one of the accepted spellings.
    pub fn from_root_name(store: S, root: &str, branch: impl Into<String>) -> Result<Self> {
        Ok(Self::with_store(store, RootKey::resolve(root)?, branch))
    }

    #[must_use]
    pub const fn root(&self) -> RootKey {
        self.root
    }

    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    #[must_use]
    pub const fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// Last segment of the branch path.
    #[must_use]
    pub fn name(&self) -> &str {
        self.branch
            .rsplit(SEPARATOR)
            .next()
            .unwrap_or(&self.branch)
    }

    /// Descriptor for a direct child. Does no I/O.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self::with_flags(
            self.store.clone(),
            self.root,
            join(&self.branch, name),
            self.flags,
        )
    }

    fn open(&self, mode: AccessMode) -> Result<ScopedHandle<'_, S>> {
        ScopedHandle::acquire(&self.store, self.root, &self.branch, mode, self.flags)
    }

    /// Whether the branch exists.
    ///
    /// # Errors
    ///
    /// Failures other than `NotFound` are propagated.
    pub fn exists(&self) -> Result<bool> {
        match self.open(AccessMode::Read) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create the branch and any missing parents. Idempotent.
    ///
    /// # Errors
    ///
    /// Failures other than `NotFound` are propagated; `NotFound` yields `false`.
    pub fn create(&self) -> Result<bool> {
        match self.open(AccessMode::Create) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a value, `None` if the branch or the name is absent.
    ///
    /// # Errors
    ///
    /// Open failures other than `NotFound` (e.g. `AccessDenied`) and read failures.
    pub fn get(&self, name: &str) -> Result<Option<Variant>> {
        let handle = match self.open(AccessMode::Read) {
            Ok(handle) => handle,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        self.store.query_value(handle.key(), name)
    }

    /// Read a value, falling back to `default` if the branch or name is absent.
    ///
    /// # Errors
    ///
    /// Same as [`RegistryDict::get`].
    pub fn get_or(&self, name: &str, default: impl Into<Variant>) -> Result<Variant> {
        Ok(self.get(name)?.unwrap_or_else(|| default.into()))
    }

    /// Whether the branch holds a value called `name`.
    ///
    /// # Errors
    ///
    /// Same as [`RegistryDict::get`].
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Write a value, creating the branch if needed.
    ///
    /// The on-disk kind follows the [`Variant`] built from `value`.
    ///
    /// # Errors
    ///
    /// `WriteFailure` naming the value when the write fails, `AccessDenied` on
    /// permission failure.
    pub fn set(&self, name: &str, value: impl Into<Variant>) -> Result<()> {
        let value = value.into();
        let handle = self.open(AccessMode::Create)?;
        self.store
            .set_value(handle.key(), name, &value)
            .map_err(|e| e.into_write_failure(name))
    }

    /// Write a value with an explicit on-disk kind, converting it first.
    ///
    /// # Errors
    ///
    /// `WriteFailure` if `value` cannot be represented as `kind`, plus
    /// everything [`RegistryDict::set`] returns.
    pub fn set_typed(&self, name: &str, value: impl Into<Variant>, kind: ValueKind) -> Result<()> {
        let value = value
            .into()
            .coerce(kind)
            .map_err(|cause| RegistryError::WriteFailure {
                name: name.to_string(),
                cause,
            })?;
        self.set(name, value)
    }

    /// Every (name, value) pair in the branch, in store order.
    ///
    /// # Errors
    ///
    /// `NotFound` if the branch is absent, or the failure that aborted the scan.
    pub fn items(&self) -> Result<Vec<(String, Variant)>> {
        let handle = self.open(AccessMode::Read)?;
        let items = scan(|index| self.store.enum_value(handle.key(), index))?;
        debug!(root = %self.root, branch = %self.branch, count = items.len(), "enumerated values");
        Ok(items)
    }

    fn subkey_names(&self, branch: &str) -> Result<Vec<String>> {
        let handle =
            ScopedHandle::acquire(&self.store, self.root, branch, AccessMode::Read, self.flags)?;
        scan(|index| self.store.enum_key(handle.key(), index))
    }

    /// Direct children of this branch.
    ///
    /// # Errors
    ///
    /// `NotFound` if the branch is absent, or the failure that aborted the scan.
    pub fn subkeys(&self) -> Result<Vec<Self>> {
        Ok(self
            .subkey_names(&self.branch)?
            .iter()
            .map(|name| self.child(name))
            .collect())
    }

    /// Every descendant, depth-first pre-order, read lazily from the store.
    ///
    /// Each call starts a fresh traversal.
    #[must_use]
    pub fn all_subkeys(&self) -> Descendants<S> {
        Descendants {
            pending: Some(self.clone()),
            stack: Vec::new(),
        }
    }

    /// Delete this branch and everything below it, children first.
    ///
    /// Not atomic: a failure part-way leaves already-deleted descendants gone.
    ///
    /// # Errors
    ///
    /// `NotFound` if the branch is absent, `AccessDenied` for the root of a
    /// hive, or the first failure hit while deleting.
    #[instrument(skip(self), fields(root = %self.root, branch = %self.branch))]
    pub fn wipe(&self) -> Result<()> {
        if self.branch.split(SEPARATOR).all(str::is_empty) {
            return Err(RegistryError::AccessDenied(format!(
                "refusing to wipe the root of {}",
                self.root
            )));
        }
        self.wipe_branch(&self.branch).inspect_err(|e| {
            warn!("wipe stopped part-way: {e}");
        })
    }

    fn wipe_branch(&self, branch: &str) -> Result<()> {
        for child in self.subkey_names(branch)? {
            self.wipe_branch(&join(branch, &child))?;
        }
        self.store.delete_key(self.root, branch, self.flags)
    }

    /// Counts of children and values, plus the last write time.
    ///
    /// # Errors
    ///
    /// `NotFound` if the branch is absent.
    pub fn info(&self) -> Result<KeyInfo> {
        let handle = self.open(AccessMode::Read)?;
        self.store.query_info(handle.key())
    }
}

impl<S: Store> PartialEq for RegistryDict<S> {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.branch == other.branch && self.flags == other.flags
    }
}

impl<S: Store> Eq for RegistryDict<S> {}

impl<S: Store> fmt::Display for RegistryDict<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.branch.is_empty() {
            write!(f, "{}", self.root)
        } else {
            write!(f, "{}{SEPARATOR}{}", self.root, self.branch)
        }
    }
}

/// Depth-first pre-order walk returned by [`RegistryDict::all_subkeys`].
///
/// A branch's children are read when the walk moves past it, so the result
/// reflects the store as it is during iteration. Stops after the first error.
pub struct Descendants<S: Store> {
    pending: Option<RegistryDict<S>>,
    stack: Vec<std::vec::IntoIter<RegistryDict<S>>>,
}

impl<S: Store + Clone> Iterator for Descendants<S> {
    type Item = Result<RegistryDict<S>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(parent) = self.pending.take() {
            match parent.subkeys() {
                Ok(children) => self.stack.push(children.into_iter()),
                Err(e) => {
                    self.stack.clear();
                    return Some(Err(e));
                }
            }
        }

        while let Some(siblings) = self.stack.last_mut() {
            match siblings.next() {
                Some(child) => {
                    self.pending = Some(child.clone());
                    return Some(Ok(child));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}
