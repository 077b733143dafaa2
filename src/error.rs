//! Error types for policy operations

use thiserror::Error;

/// Policy operation result type
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Policy operation errors
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Policy does not exist
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    /// Policy id already taken
    #[error("Policy already exists: {0}")]
    PolicyExists(String),

    /// No version record with that number
    #[error("Version {version} not found for policy {policy_id}")]
    VersionNotFound { policy_id: String, version: u32 },

    /// Version number outside the stored history range
    #[error("Version {version} is outside the stored range 1..={max} for policy {policy_id}")]
    VersionOutOfRange {
        policy_id: String,
        version: u32,
        max: u32,
    },

    /// Role does not exist
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// Role id already taken
    #[error("Role already exists: {0}")]
    RoleExists(String),

    /// System roles cannot be modified or deleted
    #[error("System role is immutable: {0}")]
    SystemRoleImmutable(String),

    /// Malformed lifecycle input, rejected before any version is recorded
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Live policy and version history would disagree
    #[error("Policy and version history disagree: {0}")]
    Consistency(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
