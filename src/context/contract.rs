//! Root marker trait, contract identity, and compile-time contract descriptors.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Upper bound when walking `extends` chains. Guards against a descriptor
/// that (incorrectly) extends itself.
const MAX_EXTENDS_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Root marker
// ---------------------------------------------------------------------------

/// Root marker trait implemented by every context object.
///
/// Capability contracts extend this trait. The marker itself is not a
/// registrable capability.
pub trait Context: Send + Sync + 'static {
    /// The capability contracts this object implements *directly*.
    ///
    /// The root marker never needs to be listed. Use
    /// [`impl_context!`](crate::impl_context) instead of writing this by hand.
    fn direct_contracts(&self) -> Vec<CapabilityType>;
}

// ---------------------------------------------------------------------------
// ContextFamily / ContractKind / Operation
// ---------------------------------------------------------------------------

/// The standard family a capability contract belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextFamily {
    /// Computation (CPU) capabilities.
    Cpu,
    /// Storage (memory) capabilities.
    Memory,
    /// I/O device capabilities.
    Device,
    /// Translation (compiler) capabilities.
    Compiler,
    /// Any other named family.
    Custom(&'static str),
}

impl ContextFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Device => "device",
            Self::Compiler => "compiler",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ContextFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a described type actually is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// The root marker (`dyn Context`) itself.
    Root,
    /// A pure trait-object contract with no state.
    Contract,
    /// A concrete type. Never registrable as a capability.
    Concrete,
}

/// The declared shape of one contract operation, used for structural
/// fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub returns: &'static str,
}

impl Operation {
    pub const fn new(
        name: &'static str,
        params: &'static [&'static str],
        returns: &'static str,
    ) -> Self {
        Self {
            name,
            params,
            returns,
        }
    }
}

// ---------------------------------------------------------------------------
// ContractDescriptor
// ---------------------------------------------------------------------------

/// Compile-time description of a capability contract.
///
/// Built with the `const` constructors below and attached to a contract via
/// [`ContextContract::DESCRIPTOR`].
#[derive(Debug, Clone, Copy)]
pub struct ContractDescriptor {
    /// Stable contract name, used as the configuration key.
    pub name: &'static str,
    /// Family used by the typed convenience lookups.
    pub family: ContextFamily,
    pub kind: ContractKind,
    /// Whether the contract is explicitly tagged as a capability.
    pub capability: bool,
    /// Explicit schema revision, bumped on incompatible changes.
    pub schema: u32,
    /// Declared operation shapes.
    pub operations: &'static [Operation],
    /// The contract this one extends, if any.
    pub extends: Option<fn() -> CapabilityType>,
}

impl ContractDescriptor {
    /// A tagged, pure capability contract at schema revision 1.
    pub const fn contract(name: &'static str, family: ContextFamily) -> Self {
        Self {
            name,
            family,
            kind: ContractKind::Contract,
            capability: true,
            schema: 1,
            operations: &[],
            extends: None,
        }
    }

    /// A descriptor for a concrete type. Rejected by validation.
    pub const fn concrete(name: &'static str, family: ContextFamily) -> Self {
        Self {
            name,
            family,
            kind: ContractKind::Concrete,
            capability: false,
            schema: 1,
            operations: &[],
            extends: None,
        }
    }

    /// The root marker descriptor.
    pub const fn root() -> Self {
        Self {
            name: "context",
            family: ContextFamily::Custom("root"),
            kind: ContractKind::Root,
            capability: false,
            schema: 1,
            operations: &[],
            extends: None,
        }
    }

    pub const fn with_schema(mut self, schema: u32) -> Self {
        self.schema = schema;
        self
    }

    pub const fn with_operations(mut self, operations: &'static [Operation]) -> Self {
        self.operations = operations;
        self
    }

    /// Declare the parent contract. Objects may list both this contract and
    /// its ancestors as direct contracts without counting as two identities.
    pub const fn extending(mut self, parent: fn() -> CapabilityType) -> Self {
        self.extends = Some(parent);
        self
    }

    /// Drop the capability tag.
    pub const fn untagged(mut self) -> Self {
        self.capability = false;
        self
    }
}

// ---------------------------------------------------------------------------
// ContextContract
// ---------------------------------------------------------------------------

/// Implemented for each capability trait-object type (`dyn CpuContext`).
pub trait ContextContract: Context {
    const DESCRIPTOR: ContractDescriptor;

    /// Upcast to the root marker. Implementations are always just `this`.
    fn upcast(this: Arc<Self>) -> Arc<dyn Context>;
}

impl ContextContract for dyn Context {
    const DESCRIPTOR: ContractDescriptor = ContractDescriptor::root();

    fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
        this
    }
}

// ---------------------------------------------------------------------------
// ContractId / CapabilityType
// ---------------------------------------------------------------------------

/// Identity of a contract type. Equality and hashing use the `TypeId` only.
#[derive(Clone, Copy)]
pub struct ContractId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ContractId {
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ContractId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ContractId {}

impl Hash for ContractId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractId({})", self.type_name)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Runtime value identifying a capability type: the contract's identity plus
/// its descriptor.
#[derive(Clone, Copy)]
pub struct CapabilityType {
    id: ContractId,
    descriptor: ContractDescriptor,
}

impl CapabilityType {
    pub fn of<C: ?Sized + ContextContract>() -> Self {
        Self {
            id: ContractId::of::<C>(),
            descriptor: C::DESCRIPTOR,
        }
    }

    pub fn id(&self) -> ContractId {
        self.id
    }

    pub fn descriptor(&self) -> &ContractDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn family(&self) -> ContextFamily {
        self.descriptor.family
    }

    pub fn is_root(&self) -> bool {
        self.descriptor.kind == ContractKind::Root
    }

    /// The direct parent contract, if declared.
    pub fn parent(&self) -> Option<CapabilityType> {
        self.descriptor.extends.map(|parent| parent())
    }

    /// True if `ancestor` appears anywhere in this contract's `extends` chain.
    pub fn extends(&self, ancestor: &CapabilityType) -> bool {
        let mut current = self.parent();
        let mut depth = 0;
        while let Some(parent) = current {
            if parent == *ancestor {
                return true;
            }
            depth += 1;
            if depth >= MAX_EXTENDS_DEPTH {
                return false;
            }
            current = parent.parent();
        }
        false
    }
}

impl PartialEq for CapabilityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CapabilityType {}

impl Hash for CapabilityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for CapabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityType")
            .field("name", &self.descriptor.name)
            .field("family", &self.descriptor.family)
            .field("type", &self.id.type_name)
            .finish()
    }
}

impl fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.descriptor.name, self.descriptor.family)
    }
}
