//! Registry event fan-out.
//!
//! See [`observer`] for delivery guarantees.

pub mod observer;

pub use observer::{
    observer_fn, FailureKind, FnObserver, ObserverError, ObserverFailure, ObserverId,
    ObserverList, RegistryEvent, RegistryObserver,
};
