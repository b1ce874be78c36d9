//! # Capability Checks
//!
//! Acceptance rules applied before anything enters the registry:
//!
//! 1. [`CapabilityValidator`]: is the declared type a registrable contract,
//!    and does the object carry exactly one capability identity?
//! 2. [`CompatibilityChecker`]: for contracts the host configured, does the
//!    contract's schema revision (or structural fingerprint) match?

pub mod compat;
pub mod validator;

pub use compat::{CompatibilityChecker, ContractFingerprint};
pub use validator::CapabilityValidator;
