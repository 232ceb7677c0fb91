//! Error types for the Zara hub core.

use thiserror::Error;

/// Failures raised by the authorization layer and the identity provider.
///
/// These are always surfaced to the caller as typed values; an `AuthError`
/// never moves the session machine out of its last valid state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email/password pair rejected by the identity provider
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Sign-up refused (duplicate email, weak password, ...)
    #[error("Sign-up rejected: {0}")]
    SignUpRejected(String),

    /// The identity provider could not be reached or failed unexpectedly
    #[error("Identity provider error: {0}")]
    Network(String),

    /// The operation needs an authenticated session
    #[error("No authenticated session")]
    NotAuthenticated,

    /// Wrong secondary admin password
    #[error("Incorrect admin password")]
    ChallengeFailed,

    /// An admin password was submitted while no challenge was pending
    #[error("No admin challenge is pending")]
    NoChallengePending,

    /// Malformed email, empty password or username
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A shared error type for the entire hub core.
///
/// Provides typed, structured variants with automatic conversion from the
/// error types of the crates the core builds on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Authorization / identity provider failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Storage backend failure (recovered locally wherever possible)
    #[error("Storage error: {0}")]
    Storage(String),

    /// A write the user explicitly triggered could not be persisted
    #[error("Save failed, please retry ({0})")]
    SaveFailed(String),

    /// A persona import batch was rejected as a whole
    #[error("Import rejected: {0}")]
    ImportValidation(String),

    /// A reply targeted a comment id that is not in the tree
    #[error("Parent comment '{parent_id}' not found in announcement '{announcement_id}'")]
    ParentNotFound {
        announcement_id: String,
        parent_id: String,
    },

    /// The current role may not perform the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Caller supplied invalid data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn save_failed(message: impl Into<String>) -> Self {
        Self::SaveFailed(message.into())
    }

    pub fn import_validation(message: impl Into<String>) -> Self {
        Self::ImportValidation(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Migration error
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_save_failed(&self) -> bool {
        matches!(self, Self::SaveFailed(_))
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    /// Returns the wrapped auth error, if any.
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(err) => Some(err),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<version_migrate::MigrationError> for CoreError {
    fn from(err: version_migrate::MigrationError) -> Self {
        Self::Migration(err.to_string())
    }
}

/// A type alias for `Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;
