//! # Context Contracts
//!
//! A *context* is a typed capability object that one component registers so
//! other components can use it without knowing its concrete type. Every
//! capability contract is a trait extending the root marker [`Context`]; the
//! capability *type* is the trait-object type (`dyn CpuContext`), described at
//! compile time by a [`ContextContract`] impl.
//!
//! ## Declaring a contract
//!
//! ```
//! use std::sync::Arc;
//! use plugin_context::context::{
//!     Context, ContextContract, ContextFamily, ContractDescriptor, CpuContext,
//!     CapabilityType,
//! };
//!
//! pub trait Z80Context: CpuContext {
//!     fn set_bus_data(&self, data: u8);
//! }
//!
//! impl ContextContract for dyn Z80Context {
//!     const DESCRIPTOR: ContractDescriptor =
//!         ContractDescriptor::contract("z80", ContextFamily::Cpu)
//!             .extending(CapabilityType::of::<dyn CpuContext>);
//!
//!     fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
//!         this
//!     }
//! }
//! ```
//!
//! Concrete objects then declare which contract they implement directly with
//! [`impl_context!`](crate::impl_context).

pub mod contract;
pub mod families;

pub use contract::{
    CapabilityType, Context, ContextContract, ContextFamily, ContractDescriptor, ContractId,
    ContractKind, Operation,
};
pub use families::{CompilerContext, CpuContext, DeviceContext, MemoryContext};

/// Implement [`Context`] for a concrete type, listing the capability
/// contracts it implements directly.
///
/// Usage:
/// ```ignore
/// impl_context!(Intel8080Cpu => dyn CpuContext);
/// ```
#[macro_export]
macro_rules! impl_context {
    ($ty:ty => $($contract:ty),+ $(,)?) => {
        impl $crate::context::Context for $ty {
            fn direct_contracts(&self) -> Vec<$crate::context::CapabilityType> {
                vec![$($crate::context::CapabilityType::of::<$contract>()),+]
            }
        }
    };
}
