//! Registry configuration.
//!
//! The host declares, per contract name, which schema revision and/or
//! structural fingerprint it was built against. Contracts not named here are
//! accepted without compatibility checks.
//!
//! A key may also be a contract's full type name (`std::any::type_name` of
//! the trait-object type), which takes precedence over the contract name. A
//! name key applies to one contract only: the first one registered under it.
//!
//! ```yaml
//! contracts:
//!   cpu:
//!     schema: 1
//!   z80:
//!     fingerprint: 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::ConfigError;

/// What the host expects of one contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractExpectation {
    /// Expected explicit schema revision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<u32>,
    /// Expected structural fingerprint (hex, any case).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl ContractExpectation {
    pub fn schema(schema: u32) -> Self {
        Self {
            schema: Some(schema),
            fingerprint: None,
        }
    }

    pub fn fingerprint(fingerprint: impl Into<String>) -> Self {
        Self {
            schema: None,
            fingerprint: Some(fingerprint.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_none() && self.fingerprint.is_none()
    }
}

/// Configuration for a [`ContextRegistry`](crate::registry::ContextRegistry).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Compatibility expectations keyed by contract name.
    #[serde(default)]
    pub contracts: HashMap<String, ContractExpectation>,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Add or replace the expectation for a contract (builder pattern).
    pub fn with_expectation(
        mut self,
        contract: impl Into<String>,
        expectation: ContractExpectation,
    ) -> Self {
        self.contracts.insert(contract.into(), expectation);
        self
    }

    pub fn expectation(&self, contract: &str) -> Option<&ContractExpectation> {
        self.contracts.get(contract).filter(|e| !e.is_empty())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, expectation) in &self.contracts {
            if let Some(fingerprint) = &expectation.fingerprint {
                if hex::decode(fingerprint).map_or(true, |bytes| bytes.len() != 32) {
                    return Err(ConfigError::Validation(format!(
                        "fingerprint for contract '{}' is not a 64-digit hex SHA-256 digest",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}
