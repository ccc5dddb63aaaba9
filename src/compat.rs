//! Free-function call forms kept for older callers.
//!
//! Each one is a thin wrapper over [`RegistryDict`]; new code should use the
//! dictionary directly.

use crate::dict::RegistryDict;
use crate::domain::{RootKey, Variant};
use crate::error::Result;
use crate::repositories::Store;

/// Check whether a branch exists.
///
/// # Errors
///
/// `UnknownRoot` for an unrecognised root; `NotFound` is reported as `false`.
#[deprecated(note = "use `RegistryDict::exists`")]
pub fn branch_exists<S: Store + Clone>(store: &S, root: &str, branch: &str) -> Result<bool> {
    RegistryDict::from_root_name(store.clone(), root, branch)?.exists()
}

/// Check whether a branch holds a value called `name`.
///
/// # Errors
///
/// `UnknownRoot` for an unrecognised root.
#[deprecated(note = "use `RegistryDict::contains`")]
pub fn value_exists<S: Store + Clone>(
    store: &S,
    root: &str,
    branch: &str,
    name: &str,
) -> Result<bool> {
    let dict = RegistryDict::from_root_name(store.clone(), root, branch)?;
    match dict.contains(name) {
        Err(e) if e.is_not_found() => Ok(false),
        other => other,
    }
}

/// Create a branch and any missing parents.
///
/// # Errors
///
/// `UnknownRoot` for an unrecognised root; `NotFound` is reported as `false`.
#[deprecated(note = "use `RegistryDict::create`")]
pub fn create_branch<S: Store + Clone>(store: &S, root: &str, branch: &str) -> Result<bool> {
    RegistryDict::from_root_name(store.clone(), root, branch)?.create()
}

/// Read a value from the 32-bit view, or `default` if absent.
///
/// # Errors
///
/// `UnknownRoot` for an unrecognised root, `AccessDenied` and other read failures.
#[deprecated(note = "use `RegistryDict::wow64_32(..).get_or`")]
pub fn get_value<S: Store + Clone>(
    store: &S,
    root: &str,
    branch: &str,
    name: &str,
    default: impl Into<Variant>,
) -> Result<Variant> {
    RegistryDict::wow64_32(store.clone(), RootKey::resolve(root)?, branch).get_or(name, default)
}

/// Write a value into the 32-bit view, creating the branch if needed.
///
/// # Errors
///
/// `UnknownRoot` for an unrecognised root, `WriteFailure` if the write fails.
#[deprecated(note = "use `RegistryDict::wow64_32(..).set`")]
pub fn set_value<S: Store + Clone>(
    store: &S,
    root: &str,
    branch: &str,
    name: &str,
    value: impl Into<Variant>,
) -> Result<()> {
    RegistryDict::wow64_32(store.clone(), RootKey::resolve(root)?, branch).set(name, value)
}
