//! CompatibilityChecker: detects contracts built against a different revision.
//!
//! Two strategies, both driven by a host-side [`ContractExpectation`]:
//!
//! - **Schema revision** (preferred): each contract declares an explicit
//!   `schema` number, compared directly.
//! - **Structural fingerprint**: a SHA-256 digest over the contract's declared
//!   operation shapes. Any rename or signature change alters it, including
//!   cosmetic ones.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::context::{CapabilityType, Operation};
use crate::utilities::config::ContractExpectation;
use crate::utilities::errors::InvalidCapability;

/// Hex-encoded SHA-256 digest of a contract's shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractFingerprint(String);

impl ContractFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a hex digest.
    pub fn matches(&self, expected: &str) -> bool {
        self.0.eq_ignore_ascii_case(expected.trim())
    }
}

impl fmt::Display for ContractFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stateless compatibility checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityChecker;

impl CompatibilityChecker {
    /// Canonical text form of a contract's shape: operations sorted
    /// lexicographically, each as `name(p1,p2)->ret;`.
    pub fn canonical_shape(capability: &CapabilityType) -> String {
        let mut operations: Vec<String> = capability
            .descriptor()
            .operations
            .iter()
            .map(serialize_operation)
            .collect();
        operations.sort();
        operations.concat()
    }

    pub fn fingerprint(capability: &CapabilityType) -> ContractFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(Self::canonical_shape(capability).as_bytes());
        ContractFingerprint(hex::encode(hasher.finalize()))
    }

    /// Recompute the fingerprint and compare it case-insensitively.
    pub fn matches(capability: &CapabilityType, expected: &str) -> bool {
        Self::fingerprint(capability).matches(expected)
    }

    /// Check a contract against the host's expectation. Both the schema and
    /// the fingerprint are checked when both are given.
    pub fn check(
        capability: &CapabilityType,
        expectation: &ContractExpectation,
    ) -> Result<(), InvalidCapability> {
        let descriptor = capability.descriptor();

        if let Some(expected) = expectation.schema {
            if descriptor.schema != expected {
                return Err(InvalidCapability::SchemaMismatch {
                    contract: descriptor.name,
                    expected,
                    found: descriptor.schema,
                });
            }
        }

        if let Some(expected) = &expectation.fingerprint {
            let found = Self::fingerprint(capability);
            if !found.matches(expected) {
                return Err(InvalidCapability::FingerprintMismatch {
                    contract: descriptor.name,
                    expected: expected.clone(),
                    found: found.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn serialize_operation(operation: &Operation) -> String {
    format!(
        "{}({})->{};",
        operation.name,
        operation.params.join(","),
        operation.returns
    )
}
