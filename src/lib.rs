pub mod compat;
pub mod dict;
pub mod domain;
pub mod error;
pub mod handle;
pub mod repositories;

// Public, stable-ish API surface for consumers

pub use crate::dict::{Descendants, RegistryDict};

pub use crate::domain::{AccessFlags, AccessMode, KeyInfo, RootKey, ValueKind, Variant};

pub use crate::error::{RegistryError, Result};

pub use crate::handle::{with_handle, ScopedHandle};

pub use crate::repositories::{MemoryStore, Store};

#[cfg(windows)]
pub use crate::repositories::WinRegistry;

pub mod prelude {
    pub use crate::dict::RegistryDict;
    pub use crate::domain::{AccessFlags, RootKey, ValueKind, Variant};
    pub use crate::error::{RegistryError, Result};
    pub use crate::repositories::{MemoryStore, Store};
    #[cfg(windows)]
    pub use crate::repositories::WinRegistry;
}
