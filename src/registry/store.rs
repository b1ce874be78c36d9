//! ContextRegistry: owner → contract → ordered instances.
//!
//! Buckets live in a sharded [`DashMap`]; each bucket publishes an immutable
//! `Arc<[Slot]>` snapshot, so lookups clone a snapshot under a brief shard
//! read lock and never contend with unrelated owners. A second map records
//! every registered object's address to enforce "registered at most once".
//!
//! Lock order is always `instances` before `buckets`, and no shard guard is
//! held while the connection graph or an observer runs.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::entry::{Bucket, BucketKey, RegistryEntry};
use super::scope::ComponentContexts;
use super::slot::Slot;
use crate::capabilities::{CapabilityValidator, CompatibilityChecker};
use crate::component::ComponentId;
use crate::context::{CapabilityType, Context, ContextContract, ContextFamily, ContractId};
use crate::events::{ObserverId, ObserverList, RegistryEvent, RegistryObserver};
use crate::policy::ConnectionGraph;
use crate::utilities::config::RegistryConfig;
use crate::utilities::errors::{InvalidCapability, LookupError, RegistrationError};

/// The in-process context registry.
///
/// Constructed by the host and shared as `Arc<ContextRegistry>`; each
/// component receives a [`ComponentContexts`] view bound to its own id.
pub struct ContextRegistry {
    buckets: DashMap<BucketKey, Bucket>,
    /// object address → bucket holding it
    instances: DashMap<usize, BucketKey>,
    /// contract name → the contract a name-keyed expectation was applied to
    pinned_names: DashMap<&'static str, ContractId>,
    graph: Box<dyn ConnectionGraph>,
    config: RegistryConfig,
    observers: ObserverList,
}

impl ContextRegistry {
    /// Create a registry that enforces `graph`.
    pub fn new(graph: impl ConnectionGraph + 'static) -> Self {
        Self::with_config(graph, RegistryConfig::default())
    }

    /// Create a registry with compatibility expectations.
    pub fn with_config(graph: impl ConnectionGraph + 'static, config: RegistryConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            instances: DashMap::new(),
            pinned_names: DashMap::new(),
            graph: Box::new(graph),
            config,
            observers: ObserverList::new(),
        }
    }

    /// A view of this registry bound to `component`.
    pub fn scope(self: &Arc<Self>, component: ComponentId) -> ComponentContexts {
        ComponentContexts::new(component, Arc::clone(self))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register `instance` under `owner` as contract `C`.
    ///
    /// Returns the index assigned within the `(owner, C)` bucket. Intended to
    /// be called during the owner's construction, before any peer looks it up.
    pub fn register<C>(&self, owner: ComponentId, instance: Arc<C>) -> Result<u32, RegistrationError>
    where
        C: ?Sized + ContextContract,
    {
        let capability = CapabilityType::of::<C>();
        let slot = Slot::new(instance);

        if let Err(e) = self.accept(slot.context().as_ref(), &capability) {
            log::warn!(
                "ContextRegistry: {} rejected {}: {}",
                owner,
                capability,
                e
            );
            return Err(e.into());
        }

        let key = BucketKey::new(owner, capability.id());
        let index = match self.instances.entry(slot.address()) {
            Entry::Occupied(_) => {
                log::warn!(
                    "ContextRegistry: {} offered an already registered instance as {}",
                    owner,
                    capability
                );
                return Err(RegistrationError::AlreadyRegistered {
                    contract: capability.name(),
                });
            }
            Entry::Vacant(vacant) => {
                let index = self
                    .buckets
                    .entry(key)
                    .or_insert_with(|| Bucket::new(capability))
                    .push(slot);
                vacant.insert(key);
                index
            }
        };

        log::debug!(
            "ContextRegistry: {} registered {} at index {}",
            owner,
            capability,
            index
        );
        self.observers.notify(&RegistryEvent::Registered {
            owner,
            capability,
            index,
        });
        Ok(index)
    }

    fn accept(&self, instance: &dyn Context, capability: &CapabilityType) -> Result<(), InvalidCapability> {
        CapabilityValidator::validate(instance, capability)?;

        let id = capability.id();
        if let Some(expectation) = self.config.expectation(id.type_name()) {
            CompatibilityChecker::check(capability, expectation)?;
        } else if let Some(expectation) = self.config.expectation(capability.name()) {
            self.pin_name(capability)?;
            CompatibilityChecker::check(capability, expectation)?;
        }
        Ok(())
    }

    /// A name-keyed expectation belongs to the first contract checked against
    /// it. Another contract reusing the name is rejected.
    fn pin_name(&self, capability: &CapabilityType) -> Result<(), InvalidCapability> {
        let id = capability.id();
        let pinned = *self.pinned_names.entry(capability.name()).or_insert(id);
        if pinned != id {
            return Err(InvalidCapability::AmbiguousContractName {
                contract: capability.name(),
                pinned: pinned.type_name(),
                found: id.type_name(),
            });
        }
        Ok(())
    }

    /// Remove `owner`'s whole bucket for contract `C`.
    pub fn unregister<C: ?Sized + ContextContract>(&self, owner: ComponentId) -> bool {
        self.unregister_type(owner, &CapabilityType::of::<C>())
    }

    /// Remove `owner`'s whole bucket for `capability`. Returns whether a
    /// bucket existed.
    pub fn unregister_type(&self, owner: ComponentId, capability: &CapabilityType) -> bool {
        let key = BucketKey::new(owner, capability.id());
        let Some((_, bucket)) = self.buckets.remove(&key) else {
            return false;
        };
        let count = self.release(&bucket);

        log::debug!(
            "ContextRegistry: {} unregistered {} ({} instances)",
            owner,
            capability,
            count
        );
        self.observers.notify(&RegistryEvent::Unregistered {
            owner,
            capability: *bucket.capability(),
            count,
        });
        true
    }

    /// Host teardown: remove every bucket `owner` holds. Returns the number of
    /// buckets removed.
    pub fn clear_owner(&self, owner: ComponentId) -> usize {
        let keys: Vec<BucketKey> = self
            .buckets
            .iter()
            .filter(|entry| entry.key().owner == owner)
            .map(|entry| *entry.key())
            .collect();

        let mut removed = 0;
        for key in keys {
            if let Some((_, bucket)) = self.buckets.remove(&key) {
                self.release(&bucket);
                removed += 1;
            }
        }

        if removed > 0 {
            log::debug!("ContextRegistry: cleared {} buckets of {}", removed, owner);
            self.observers.notify(&RegistryEvent::OwnerCleared {
                owner,
                buckets: removed,
            });
        }
        removed
    }

    /// Forget the identities of a removed bucket's instances.
    fn release(&self, bucket: &Bucket) -> usize {
        let slots = bucket.snapshot();
        for slot in slots.iter() {
            self.instances.remove(&slot.address());
        }
        slots.len()
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Look up the `index`-th instance `owner` registered as contract `C`.
    ///
    /// A missing bucket, a denied connection, and an out-of-range index all
    /// return [`LookupError::NotFound`].
    pub fn lookup<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        let slot = self.resolve(requester, owner, &CapabilityType::of::<C>(), index)?;
        slot.downcast::<C>().ok_or(LookupError::NotFound)
    }

    /// Untyped lookup returning the root-marker view of the instance.
    pub fn lookup_context(
        &self,
        requester: ComponentId,
        owner: ComponentId,
        capability: &CapabilityType,
        index: u32,
    ) -> Result<Arc<dyn Context>, LookupError> {
        self.resolve(requester, owner, capability, index)
            .map(|slot| Arc::clone(slot.context()))
    }

    fn resolve(
        &self,
        requester: ComponentId,
        owner: ComponentId,
        capability: &CapabilityType,
        index: u32,
    ) -> Result<Slot, LookupError> {
        if !self.is_visible(requester, owner) {
            log::trace!("ContextRegistry: lookup by {} of {} not found", requester, capability);
            return Err(LookupError::NotFound);
        }

        let snapshot = self
            .buckets
            .get(&BucketKey::new(owner, capability.id()))
            .map(|bucket| bucket.snapshot());

        snapshot
            .and_then(|slots| slots.get(index as usize).cloned())
            .ok_or_else(|| {
                log::trace!("ContextRegistry: lookup by {} of {} not found", requester, capability);
                LookupError::NotFound
            })
    }

    /// Self-lookups are always visible; anything else asks the graph.
    pub fn is_visible(&self, requester: ComponentId, owner: ComponentId) -> bool {
        requester == owner || self.graph.is_connected(requester, owner)
    }

    // -----------------------------------------------------------------------
    // Family-typed lookups
    // -----------------------------------------------------------------------

    fn lookup_family<C: ?Sized + ContextContract>(
        &self,
        expected: ContextFamily,
        requester: ComponentId,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        let capability = CapabilityType::of::<C>();
        if capability.family() != expected {
            return Err(InvalidCapability::FamilyMismatch {
                contract: capability.name(),
                expected,
                found: capability.family(),
            }
            .into());
        }
        self.lookup::<C>(requester, owner, index)
    }

    /// First CPU-family context of `owner` registered as `C`.
    pub fn cpu_context<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
    ) -> Result<Arc<C>, LookupError> {
        self.cpu_context_at(requester, owner, 0)
    }

    pub fn cpu_context_at<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        self.lookup_family(ContextFamily::Cpu, requester, owner, index)
    }

    /// First memory-family context of `owner` registered as `C`, typically
    /// `dyn MemoryContext<Cell>`.
    pub fn memory_context<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
    ) -> Result<Arc<C>, LookupError> {
        self.memory_context_at(requester, owner, 0)
    }

    pub fn memory_context_at<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        self.lookup_family(ContextFamily::Memory, requester, owner, index)
    }

    /// First device-family context of `owner` registered as `C`, typically
    /// `dyn DeviceContext<Data>`.
    pub fn device_context<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
    ) -> Result<Arc<C>, LookupError> {
        self.device_context_at(requester, owner, 0)
    }

    pub fn device_context_at<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        self.lookup_family(ContextFamily::Device, requester, owner, index)
    }

    pub fn compiler_context<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
    ) -> Result<Arc<C>, LookupError> {
        self.compiler_context_at(requester, owner, 0)
    }

    pub fn compiler_context_at<C: ?Sized + ContextContract>(
        &self,
        requester: ComponentId,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        self.lookup_family(ContextFamily::Compiler, requester, owner, index)
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    pub fn subscribe(&self, observer: Arc<dyn RegistryObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Every entry `owner` holds, ordered by contract name then index.
    pub fn entries(&self, owner: ComponentId) -> Vec<RegistryEntry> {
        let mut entries: Vec<RegistryEntry> = Vec::new();
        for bucket in self.buckets.iter().filter(|b| b.key().owner == owner) {
            let capability = *bucket.capability();
            entries.extend((0..bucket.len() as u32).map(|index| RegistryEntry {
                owner,
                capability,
                index,
            }));
        }
        entries.sort_by(|a, b| {
            a.capability
                .name()
                .cmp(b.capability.name())
                .then_with(|| a.capability.id().type_name().cmp(b.capability.id().type_name()))
                .then(a.index.cmp(&b.index))
        });
        entries
    }

    /// Number of instances in `owner`'s bucket for `C`.
    pub fn bucket_len<C: ?Sized + ContextContract>(&self, owner: ComponentId) -> usize {
        self.buckets
            .get(&BucketKey::new(owner, CapabilityType::of::<C>().id()))
            .map_or(0, |bucket| bucket.len())
    }

    /// Whether this exact object is registered anywhere.
    pub fn contains_instance<C: ?Sized + ContextContract>(&self, instance: &Arc<C>) -> bool {
        let address = Arc::as_ptr(instance) as *const () as usize;
        self.instances.contains_key(&address)
    }

    /// Owners holding at least one bucket, sorted.
    pub fn owners(&self) -> Vec<ComponentId> {
        let mut owners: Vec<ComponentId> = self.buckets.iter().map(|b| b.key().owner).collect();
        owners.sort();
        owners.dedup();
        owners
    }

    /// Total number of registered instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl std::fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("buckets", &self.buckets.len())
            .field("instances", &self.instances.len())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
