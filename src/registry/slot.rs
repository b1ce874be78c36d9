//! Type-erased storage for one registered context.
//!
//! A slot keeps the instance twice: once as the original `Arc<C>` (boxed in
//! `dyn Any` so typed lookups can get it back without re-coercion), and once
//! upcast to `Arc<dyn Context>` for untyped access and identity.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::context::{Context, ContextContract};

#[derive(Clone)]
pub(crate) struct Slot {
    /// Holds an `Arc<C>` for the contract type `C`.
    typed: Arc<dyn Any + Send + Sync>,
    context: Arc<dyn Context>,
}

impl Slot {
    pub(crate) fn new<C: ?Sized + ContextContract>(instance: Arc<C>) -> Self {
        Self {
            context: C::upcast(instance.clone()),
            typed: Arc::new(instance),
        }
    }

    /// Identity of the underlying object: the address of its allocation.
    /// The same object offered under two contracts has one address.
    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.context) as *const () as usize
    }

    pub(crate) fn context(&self) -> &Arc<dyn Context> {
        &self.context
    }

    pub(crate) fn downcast<C: ?Sized + ContextContract>(&self) -> Option<Arc<C>> {
        self.typed.downcast_ref::<Arc<C>>().cloned()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("contracts", &self.context.direct_contracts())
            .field("address", &format_args!("{:#x}", self.address()))
            .finish_non_exhaustive()
    }
}
