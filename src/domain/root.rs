//! Well-known registry roots and their accepted spellings.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the predefined top-level registry hives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RootKey {
    /// HKEY_CURRENT_USER
    CurrentUser,
    /// HKEY_LOCAL_MACHINE
    LocalMachine,
    /// HKEY_CLASSES_ROOT
    ClassesRoot,
    /// HKEY_CURRENT_CONFIG
    CurrentConfig,
    /// HKEY_USERS
    Users,
}

const ROOTS: [(&str, &str, RootKey); 5] = [
    ("HKLM", "HKEY_LOCAL_MACHINE", RootKey::LocalMachine),
    ("HKCU", "HKEY_CURRENT_USER", RootKey::CurrentUser),
    ("HKCR", "HKEY_CLASSES_ROOT", RootKey::ClassesRoot),
    ("HKCC", "HKEY_CURRENT_CONFIG", RootKey::CurrentConfig),
    ("HKU", "HKEY_USERS", RootKey::Users),
];

impl RootKey {
    pub const ALL: [RootKey; 5] = [
        RootKey::CurrentUser,
        RootKey::LocalMachine,
        RootKey::ClassesRoot,
        RootKey::CurrentConfig,
        RootKey::Users,
    ];

    /// Resolve a short alias (`HKCU`) or canonical name (`HKEY_CURRENT_USER`).
    ///
    /// Matching is exact and case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownRoot`] for any other spelling.
    pub fn resolve(name: &str) -> Result<Self> {
        ROOTS
            .iter()
            .find(|(short, long, _)| *short == name || *long == name)
            .map(|(_, _, root)| *root)
            .ok_or_else(|| RegistryError::UnknownRoot(name.to_string()))
    }

    #[must_use]
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::CurrentUser => "HKCU",
            Self::LocalMachine => "HKLM",
            Self::ClassesRoot => "HKCR",
            Self::CurrentConfig => "HKCC",
            Self::Users => "HKU",
        }
    }

    #[must_use]
    pub const fn long_name(&self) -> &'static str {
        match self {
            Self::CurrentUser => "HKEY_CURRENT_USER",
            Self::LocalMachine => "HKEY_LOCAL_MACHINE",
            Self::ClassesRoot => "HKEY_CLASSES_ROOT",
            Self::CurrentConfig => "HKEY_CURRENT_CONFIG",
            Self::Users => "HKEY_USERS",
        }
    }

    /// Native predefined handle for this root.
    #[cfg(windows)]
    #[must_use]
    pub const fn hkey(&self) -> winreg::HKEY {
        use winreg::enums::*;

        match self {
            Self::CurrentUser => HKEY_CURRENT_USER,
            Self::LocalMachine => HKEY_LOCAL_MACHINE,
            Self::ClassesRoot => HKEY_CLASSES_ROOT,
            Self::CurrentConfig => HKEY_CURRENT_CONFIG,
            Self::Users => HKEY_USERS,
        }
    }
}

impl FromStr for RootKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_ten_spellings() {
        for root in RootKey::ALL {
            assert_eq!(RootKey::resolve(root.short_name()), Ok(root));
            assert_eq!(RootKey::resolve(root.long_name()), Ok(root));
        }
    }

    #[test]
    fn resolution_is_case_sensitive() {
        assert_eq!(
            RootKey::resolve("hkcu"),
            Err(RegistryError::UnknownRoot("hkcu".to_string()))
        );
        assert!("HKEY_Current_User".parse::<RootKey>().is_err());
        assert!(RootKey::resolve("").is_err());
    }

    #[test]
    fn displays_short_alias() {
        assert_eq!(RootKey::LocalMachine.to_string(), "HKLM");
    }
}
