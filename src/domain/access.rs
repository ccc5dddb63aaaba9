use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// How a branch is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    /// Open an existing branch for reading.
    Read,
    /// Open for writing, creating the branch and any missing parents.
    Create,
}

impl AccessMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
        }
    }
}

/// Extra native flags OR-ed into the requested access mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AccessFlags(u32);

impl AccessFlags {
    pub const NONE: Self = Self(0);
    /// KEY_WOW64_64KEY
    pub const WOW64_64KEY: Self = Self(0x0100);
    /// KEY_WOW64_32KEY
    pub const WOW64_32KEY: Self = Self(0x0200);
    pub const OWNER_SECURITY_INFORMATION: Self = Self(0x0001);
    pub const DACL_SECURITY_INFORMATION: Self = Self(0x0004);
    /// Owner and DACL security information together.
    pub const SECURITY_INFORMATION: Self =
        Self(Self::DACL_SECURITY_INFORMATION.0 | Self::OWNER_SECURITY_INFORMATION.0);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for AccessFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
