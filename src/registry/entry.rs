//! Registry entries and bucket keys.

use std::fmt;
use std::sync::Arc;

use super::slot::Slot;
use crate::component::ComponentId;
use crate::context::{CapabilityType, ContractId};

/// Read-only snapshot of one registered entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub owner: ComponentId,
    pub capability: CapabilityType,
    /// 0-based position within the `(owner, capability)` bucket.
    pub index: u32,
}

impl fmt::Display for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}[{}]", self.owner, self.capability.name(), self.index)
    }
}

/// `(owner, contract)` pair identifying one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BucketKey {
    pub(crate) owner: ComponentId,
    pub(crate) contract: ContractId,
}

impl BucketKey {
    pub(crate) fn new(owner: ComponentId, contract: ContractId) -> Self {
        Self { owner, contract }
    }
}

/// Ordered instances registered by one owner under one contract.
///
/// Copy-on-write: every append publishes a fresh slice, so a reader holding a
/// snapshot never observes a half-updated list.
#[derive(Debug)]
pub(crate) struct Bucket {
    capability: CapabilityType,
    slots: Arc<[Slot]>,
}

impl Bucket {
    pub(crate) fn new(capability: CapabilityType) -> Self {
        Self {
            capability,
            slots: Arc::from(Vec::new()),
        }
    }

    /// Append and return the assigned index.
    pub(crate) fn push(&mut self, slot: Slot) -> u32 {
        let mut slots = self.slots.to_vec();
        let index = slots.len() as u32;
        slots.push(slot);
        self.slots = slots.into();
        index
    }

    pub(crate) fn snapshot(&self) -> Arc<[Slot]> {
        Arc::clone(&self.slots)
    }

    pub(crate) fn capability(&self) -> &CapabilityType {
        &self.capability
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
