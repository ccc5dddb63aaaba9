use thiserror::Error;

pub type Result<T = (), E = RegistryError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry branch not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Failed to write registry value '{name}': {cause}")]
    WriteFailure { name: String, cause: String },

    #[error("Unknown registry root: {0}")]
    UnknownRoot(String),

    #[error("Registry operation failed: {0}")]
    OsFailure(String),
}

impl RegistryError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Attach the failing value name, keeping permission failures distinct.
    pub(crate) fn into_write_failure(self, name: &str) -> Self {
        match self {
            Self::AccessDenied(_) | Self::WriteFailure { .. } => self,
            other => Self::WriteFailure {
                name: name.to_string(),
                cause: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(e.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied(e.to_string()),
            _ => Self::OsFailure(e.to_string()),
        }
    }
}
