//! # Context Registry
//!
//! The in-memory store through which components discover each other's
//! contexts:
//!
//! ```text
//! construction   register(owner, Arc<dyn Contract>) ── validated, appended
//!                      │
//! initialization lookup(requester, owner, index)
//!                      │ requester == owner, or ConnectionGraph says yes?
//!                      ▼
//!                instance, or a uniform NotFound
//! ```
//!
//! Each `(owner, contract)` pair has its own ordered bucket; indices are
//! dense and assigned in registration order.

pub mod entry;
pub mod scope;
pub(crate) mod slot;
pub mod store;

pub use entry::RegistryEntry;
pub use scope::ComponentContexts;
pub use store::ContextRegistry;
