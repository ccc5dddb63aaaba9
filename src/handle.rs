//! Scoped ownership of one open branch handle.

use crate::domain::{AccessFlags, AccessMode, RootKey};
use crate::error::Result;
use crate::repositories::Store;
use std::mem::ManuallyDrop;
use tracing::debug;

/// Exactly one open handle to (root, branch), released exactly once on drop.
///
/// Release failures are logged and swallowed so they never replace the
/// outcome of the work done inside the scope.
pub struct ScopedHandle<'s, S: Store> {
    store: &'s S,
    key: ManuallyDrop<S::Key>,
    root: RootKey,
    branch: String,
}

impl<'s, S: Store> ScopedHandle<'s, S> {
    /// Open `branch` under `root`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the branch is absent in [`AccessMode::Read`],
    /// `AccessDenied` on permission failure, `OsFailure` otherwise.
    pub fn acquire(
        store: &'s S,
        root: RootKey,
        branch: &str,
        mode: AccessMode,
        flags: AccessFlags,
    ) -> Result<Self> {
        let key = store.open(root, branch, mode, flags)?;
        Ok(Self {
            store,
            key: ManuallyDrop::new(key),
            root,
            branch: branch.to_string(),
        })
    }

    #[must_use]
    pub fn key(&self) -> &S::Key {
        &self.key
    }

    #[must_use]
    pub const fn root(&self) -> RootKey {
        self.root
    }

    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl<S: Store> Drop for ScopedHandle<'_, S> {
    fn drop(&mut self) {
        // SAFETY: `key` is taken here and nowhere else, and never touched again.
        let key = unsafe { ManuallyDrop::take(&mut self.key) };
        if let Err(e) = self.store.close(key) {
            debug!(root = %self.root, branch = %self.branch, "ignoring close failure: {e}");
        }
    }
}

/// Run `f` against a freshly opened handle, closing it however `f` exits.
///
/// # Errors
///
/// Propagates the open failure or whatever `f` returns.
pub fn with_handle<S, F, R>(
    store: &S,
    root: RootKey,
    branch: &str,
    mode: AccessMode,
    flags: AccessFlags,
    f: F,
) -> Result<R>
where
    S: Store,
    F: FnOnce(&S::Key) -> Result<R>,
{
    let handle = ScopedHandle::acquire(store, root, branch, mode, flags)?;
    f(handle.key())
}
