//! Registry observers: synchronous fan-out of registry mutations.
//!
//! Observers are invoked in subscription order, on the mutating thread, after
//! the mutation has been committed. A failing observer (error or panic) is
//! logged and reported back, and never prevents delivery to later observers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::component::ComponentId;
use crate::context::CapabilityType;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A committed registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// An instance was appended to `owner`'s bucket at `index`.
    Registered {
        owner: ComponentId,
        capability: CapabilityType,
        index: u32,
    },
    /// A whole bucket holding `count` instances was removed by its owner.
    Unregistered {
        owner: ComponentId,
        capability: CapabilityType,
        count: usize,
    },
    /// The host tore down every bucket of `owner`.
    OwnerCleared { owner: ComponentId, buckets: usize },
}

impl RegistryEvent {
    pub fn owner(&self) -> ComponentId {
        match self {
            Self::Registered { owner, .. }
            | Self::Unregistered { owner, .. }
            | Self::OwnerCleared { owner, .. } => *owner,
        }
    }
}

// ---------------------------------------------------------------------------
// Observer trait
// ---------------------------------------------------------------------------

/// Error returned by an observer. Reported, never propagated to the registry
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ObserverError {
    pub message: String,
}

impl ObserverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receives registry events.
pub trait RegistryObserver: Send + Sync {
    /// Name used in failure reports.
    fn name(&self) -> &str {
        "observer"
    }

    fn on_event(&self, event: &RegistryEvent) -> Result<(), ObserverError>;
}

/// Adapter turning a closure into a named observer.
pub struct FnObserver<F> {
    name: String,
    f: F,
}

/// Wrap a closure as a [`RegistryObserver`].
pub fn observer_fn<F>(name: impl Into<String>, f: F) -> FnObserver<F>
where
    F: Fn(&RegistryEvent) -> Result<(), ObserverError> + Send + Sync,
{
    FnObserver {
        name: name.into(),
        f,
    }
}

impl<F> RegistryObserver for FnObserver<F>
where
    F: Fn(&RegistryEvent) -> Result<(), ObserverError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, event: &RegistryEvent) -> Result<(), ObserverError> {
        (self.f)(event)
    }
}

// ---------------------------------------------------------------------------
// ObserverList
// ---------------------------------------------------------------------------

/// Handle returned by [`ObserverList::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// How an observer failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Error(ObserverError),
    Panic(String),
}

/// One observer's failure while handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverFailure {
    pub observer: String,
    pub kind: FailureKind,
}

impl fmt::Display for ObserverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::Error(e) => write!(f, "observer '{}' failed: {}", self.observer, e),
            FailureKind::Panic(msg) => write!(f, "observer '{}' panicked: {}", self.observer, msg),
        }
    }
}

/// Ordered list of observers.
#[derive(Default)]
pub struct ObserverList {
    observers: RwLock<Vec<(ObserverId, Arc<dyn RegistryObserver>)>>,
    next_id: AtomicU64,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer; it runs after every observer subscribed before it.
    pub fn subscribe(&self, observer: Arc<dyn RegistryObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Deliver `event` to every observer, in order.
    ///
    /// The list is snapshotted first, so observers may subscribe or
    /// unsubscribe from inside a callback; the change applies to the next event.
    pub fn notify(&self, event: &RegistryEvent) -> Vec<ObserverFailure> {
        let snapshot: Vec<Arc<dyn RegistryObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        let mut failures = Vec::new();
        for observer in snapshot {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                observer.on_event(event)
            }));
            let kind = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => {
                    log::warn!("[ObserverList] observer '{}' failed: {}", observer.name(), e);
                    FailureKind::Error(e)
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log::error!(
                        "[ObserverList] observer '{}' panicked: {}",
                        observer.name(),
                        message
                    );
                    FailureKind::Panic(message)
                }
            };
            failures.push(ObserverFailure {
                observer: observer.name().to_string(),
                kind,
            });
        }
        failures
    }
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
