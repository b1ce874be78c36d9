//! Error types for the context registry.
//!
//! Every failure is local to the calling component's load attempt; nothing
//! here is fatal to the process.

use thiserror::Error;

use crate::context::ContextFamily;

/// Why a capability type or a candidate instance was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCapability {
    /// The type is concrete or not tagged as a capability contract.
    #[error("{contract} is not a capability contract")]
    NotACapabilityType { contract: &'static str },

    /// The root marker itself was offered as a capability type.
    #[error("the root context marker is not a registrable capability")]
    RootMarker,

    /// The instance does not declare the contract among its direct contracts.
    #[error("instance does not implement {contract} directly")]
    NotImplemented { contract: &'static str },

    /// The instance declares more than one unrelated capability directly.
    #[error("instance registered as {contract} implements several capabilities directly: {}", found.join(", "))]
    MultipleCapabilities {
        contract: &'static str,
        found: Vec<&'static str>,
    },

    /// Explicit schema revision does not match the configured one.
    #[error("{contract} has schema revision {found}, expected {expected}")]
    SchemaMismatch {
        contract: &'static str,
        expected: u32,
        found: u32,
    },

    /// Structural fingerprint does not match the configured one.
    #[error("{contract} has fingerprint {found}, expected {expected}")]
    FingerprintMismatch {
        contract: &'static str,
        expected: String,
        found: String,
    },

    /// A family-typed lookup was asked for a contract of another family.
    #[error("{contract} belongs to the {found} family, not {expected}")]
    FamilyMismatch {
        contract: &'static str,
        expected: ContextFamily,
        found: ContextFamily,
    },

    /// A name-keyed expectation already applies to a different contract
    /// with the same name.
    #[error("contract name {contract} is configured for {pinned}, not {found}")]
    AmbiguousContractName {
        contract: &'static str,
        pinned: &'static str,
        found: &'static str,
    },
}

impl InvalidCapability {
    /// Short stable reason code, suitable for logs and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotACapabilityType { .. } => "not_a_capability_type",
            Self::RootMarker => "root_marker",
            Self::NotImplemented { .. } => "not_implemented",
            Self::MultipleCapabilities { .. } => "multiple_capabilities",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::FingerprintMismatch { .. } => "fingerprint_mismatch",
            Self::FamilyMismatch { .. } => "family_mismatch",
            Self::AmbiguousContractName { .. } => "ambiguous_contract_name",
        }
    }
}

/// Errors returned by `register`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The exact instance is already present somewhere in the registry.
    #[error("instance is already registered (offered as {contract})")]
    AlreadyRegistered { contract: &'static str },

    #[error(transparent)]
    InvalidCapability(#[from] InvalidCapability),
}

/// Errors returned by lookups.
///
/// `NotFound` deliberately carries nothing: a missing bucket, a denied
/// connection, and an out-of-range index all look the same to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("context not found")]
    NotFound,

    #[error(transparent)]
    InvalidCapability(#[from] InvalidCapability),
}

/// Errors loading a [`RegistryConfig`](super::config::RegistryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
