//! # plugin-context
//!
//! In-process context registry for plugin-based emulator hosts.
//!
//! Components (CPUs, memories, devices, compilers) are constructed by a host
//! in dependency order. During construction each one publishes its
//! *contexts*, objects implementing a capability contract such as
//! [`CpuContext`](context::CpuContext), into a shared [`ContextRegistry`].
//! During initialization, peers look those contexts up by owner, contract,
//! and index, subject to the host's [`ConnectionGraph`](policy::ConnectionGraph).
//!
//! ```text
//! context/        contract model: Context, ContextContract, families
//! capabilities/   acceptance: CapabilityValidator, CompatibilityChecker
//! registry/       ContextRegistry store + per-component ComponentContexts
//! policy/         ConnectionGraph implementations
//! events/         registry observers
//! utilities/      errors and configuration
//! ```

pub mod capabilities;
pub mod component;
pub mod context;
pub mod events;
pub mod policy;
pub mod registry;
pub mod utilities;

pub use component::ComponentId;
pub use context::{CapabilityType, Context, ContextContract, ContextFamily, ContractDescriptor};
pub use events::{RegistryEvent, RegistryObserver};
pub use registry::{ComponentContexts, ContextRegistry, RegistryEntry};
pub use utilities::config::{ContractExpectation, RegistryConfig};
pub use utilities::errors::{ConfigError, InvalidCapability, LookupError, RegistrationError};
