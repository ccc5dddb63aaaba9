//! Typed registry values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// On-disk value kind used when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// REG_DWORD
    Integer,
    /// REG_SZ
    String,
    /// REG_MULTI_SZ
    StringList,
    /// REG_BINARY
    Binary,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "REG_DWORD",
            Self::String => "REG_SZ",
            Self::StringList => "REG_MULTI_SZ",
            Self::Binary => "REG_BINARY",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored under a branch.
///
/// Conversions from plain Rust types pick the kind in a fixed order: `u32`
/// becomes [`Variant::Integer`], string sequences become
/// [`Variant::StringList`], and strings become [`Variant::String`]. Binary data
/// is never inferred; build [`Variant::Binary`] directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Integer(u32),
    String(String),
    StringList(Vec<String>),
    Binary(Vec<u8>),
}

impl Variant {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::String(_) => ValueKind::String,
            Self::StringList(_) => ValueKind::StringList,
            Self::Binary(_) => ValueKind::Binary,
        }
    }

    #[must_use]
    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Convert to the requested on-disk kind.
    ///
    /// Returns a description of the mismatch when no conversion exists.
    pub fn coerce(self, kind: ValueKind) -> Result<Self, String> {
        if self.kind() == kind {
            return Ok(self);
        }

        match (self, kind) {
            (Self::Integer(v), ValueKind::String) => Ok(Self::String(v.to_string())),
            (Self::String(s), ValueKind::Integer) => s
                .trim()
                .parse::<u32>()
                .map(Self::Integer)
                .map_err(|e| format!("'{s}' is not a 32-bit integer: {e}")),
            (Self::String(s), ValueKind::StringList) => Ok(Self::StringList(vec![s])),
            (Self::Integer(v), ValueKind::Binary) => Ok(Self::Binary(v.to_le_bytes().to_vec())),
            (Self::String(s), ValueKind::Binary) => Ok(Self::Binary(s.into_bytes())),
            (Self::StringList(l), ValueKind::Binary) => Ok(Self::Binary(l.join("\0").into_bytes())),
            (other, kind) => Err(format!("cannot store {} as {kind}", other.kind())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::StringList(l) => write!(f, "[{}]", l.join(", ")),
            Self::Binary(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Self::Integer(v)
    }
}

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Variant {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<&String> for Variant {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<Vec<String>> for Variant {
    fn from(l: Vec<String>) -> Self {
        Self::StringList(l)
    }
}

impl From<Vec<&str>> for Variant {
    fn from(l: Vec<&str>) -> Self {
        Self::StringList(l.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Variant {
    fn from(l: &[&str]) -> Self {
        Self::StringList(l.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Variant {
    fn from(l: [&str; N]) -> Self {
        Self::StringList(l.iter().map(|s| (*s).to_string()).collect())
    }
}
