//! Backends for the hierarchical store.
//!
//! Every backend exposes the same raw, handle-based operations; the
//! dictionary layer in [`crate::dict`] is written against [`Store`] only.

pub mod memory;
#[cfg(windows)]
pub mod registry;

pub use memory::MemoryStore;
#[cfg(windows)]
pub use registry::WinRegistry;

use crate::domain::{AccessFlags, AccessMode, KeyInfo, RootKey, Variant};
use crate::error::Result;

/// Raw operations over opaque branch handles.
///
/// Enumeration is index-based: asking for index `i` on the same open key
/// yields the same entry, and `Ok(None)` marks the end of the range.
pub trait Store {
    /// An open branch. Owned by exactly one [`crate::ScopedHandle`].
    type Key;

    /// Open `path` under `root`.
    ///
    /// In [`AccessMode::Read`] a missing branch fails with `NotFound`; in
    /// [`AccessMode::Create`] every missing segment is created.
    fn open(&self, root: RootKey, path: &str, mode: AccessMode, flags: AccessFlags)
        -> Result<Self::Key>;

    /// Release a handle returned by [`Store::open`].
    fn close(&self, key: Self::Key) -> Result<()>;

    fn enum_key(&self, key: &Self::Key, index: u32) -> Result<Option<String>>;

    fn enum_value(&self, key: &Self::Key, index: u32) -> Result<Option<(String, Variant)>>;

    /// Read one value; `Ok(None)` when the name is absent.
    fn query_value(&self, key: &Self::Key, name: &str) -> Result<Option<Variant>>;

    fn set_value(&self, key: &Self::Key, name: &str, value: &Variant) -> Result<()>;

    /// Delete a branch that has no children.
    fn delete_key(&self, root: RootKey, path: &str, flags: AccessFlags) -> Result<()>;

    fn query_info(&self, key: &Self::Key) -> Result<KeyInfo>;
}

/// Separator between branch path segments.
pub const SEPARATOR: char = '\\';

/// Join a parent branch and a child name.
#[must_use]
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{SEPARATOR}{child}")
    }
}
