//! Component-scoped registry view.
//!
//! The host hands each component a [`ComponentContexts`] at construction. The
//! component's own id is bound into it, so lookups take only the target owner
//! and `unregister` can only ever touch the component's own buckets. The view
//! does not expose the underlying registry.

use std::sync::Arc;

use super::store::ContextRegistry;
use crate::component::ComponentId;
use crate::context::{CapabilityType, Context, ContextContract};
use crate::utilities::errors::{LookupError, RegistrationError};

/// A registry view bound to one component.
#[derive(Debug, Clone)]
pub struct ComponentContexts {
    id: ComponentId,
    registry: Arc<ContextRegistry>,
}

impl ComponentContexts {
    pub(crate) fn new(id: ComponentId, registry: Arc<ContextRegistry>) -> Self {
        Self { id, registry }
    }

    /// The component this view is bound to.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Register one of this component's contexts as contract `C`.
    pub fn register<C: ?Sized + ContextContract>(&self, instance: Arc<C>) -> Result<u32, RegistrationError> {
        self.registry.register(self.id, instance)
    }

    /// Remove this component's bucket for `C`.
    pub fn unregister<C: ?Sized + ContextContract>(&self) -> bool {
        self.registry.unregister::<C>(self.id)
    }

    pub fn lookup<C: ?Sized + ContextContract>(&self, owner: ComponentId, index: u32) -> Result<Arc<C>, LookupError> {
        self.registry.lookup::<C>(self.id, owner, index)
    }

    pub fn lookup_context(
        &self,
        owner: ComponentId,
        capability: &CapabilityType,
        index: u32,
    ) -> Result<Arc<dyn Context>, LookupError> {
        self.registry.lookup_context(self.id, owner, capability, index)
    }

    pub fn cpu_context<C: ?Sized + ContextContract>(&self, owner: ComponentId) -> Result<Arc<C>, LookupError> {
        self.registry.cpu_context::<C>(self.id, owner)
    }

    pub fn cpu_context_at<C: ?Sized + ContextContract>(
        &self,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        self.registry.cpu_context_at::<C>(self.id, owner, index)
    }

    pub fn memory_context<C: ?Sized + ContextContract>(&self, owner: ComponentId) -> Result<Arc<C>, LookupError> {
        self.registry.memory_context::<C>(self.id, owner)
    }

    pub fn memory_context_at<C: ?Sized + ContextContract>(
        &self,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        self.registry.memory_context_at::<C>(self.id, owner, index)
    }

    pub fn device_context<C: ?Sized + ContextContract>(&self, owner: ComponentId) -> Result<Arc<C>, LookupError> {
        self.registry.device_context::<C>(self.id, owner)
    }

    pub fn device_context_at<C: ?Sized + ContextContract>(
        &self,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        self.registry.device_context_at::<C>(self.id, owner, index)
    }

    pub fn compiler_context<C: ?Sized + ContextContract>(&self, owner: ComponentId) -> Result<Arc<C>, LookupError> {
        self.registry.compiler_context::<C>(self.id, owner)
    }

    pub fn compiler_context_at<C: ?Sized + ContextContract>(
        &self,
        owner: ComponentId,
        index: u32,
    ) -> Result<Arc<C>, LookupError> {
        self.registry.compiler_context_at::<C>(self.id, owner, index)
    }
}
