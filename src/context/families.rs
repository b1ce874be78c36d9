//! The four standard capability families.
//!
//! These traits are extension points: a concrete CPU, memory, device, or
//! compiler extends the matching family contract with whatever operations its
//! peers need, and declares the extended contract with
//! [`ContractDescriptor::extending`].

use std::sync::Arc;

use super::contract::{Context, ContextContract, ContextFamily, ContractDescriptor, Operation};
use crate::component::ComponentId;

// ---------------------------------------------------------------------------
// CPU
// ---------------------------------------------------------------------------

/// Capability offered by a CPU to the devices wired to it.
pub trait CpuContext: Context {
    /// Whether the CPU accepts interrupt signals.
    fn is_interrupt_supported(&self) -> bool {
        false
    }

    /// Raise an interrupt on behalf of `source`.
    fn signal_interrupt(&self, _source: ComponentId, _mask: u32) {}

    /// Withdraw a previously raised interrupt.
    fn clear_interrupt(&self, _source: ComponentId, _mask: u32) {}
}

const CPU_OPERATIONS: &[Operation] = &[
    Operation::new("is_interrupt_supported", &[], "bool"),
    Operation::new("signal_interrupt", &["ComponentId", "u32"], "()"),
    Operation::new("clear_interrupt", &["ComponentId", "u32"], "()"),
];

impl ContextContract for dyn CpuContext {
    const DESCRIPTOR: ContractDescriptor =
        ContractDescriptor::contract("cpu", ContextFamily::Cpu).with_operations(CPU_OPERATIONS);

    fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
        this
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Capability offered by an operating memory, generic over the cell type.
pub trait MemoryContext<C>: Context {
    /// Number of addressable cells.
    fn size(&self) -> usize;

    /// Read one cell, or `None` past the end.
    fn read(&self, address: usize) -> Option<C>;

    /// Write one cell. Returns `false` if the address is out of range or
    /// read-only.
    fn write(&self, address: usize, value: C) -> bool;
}

const MEMORY_OPERATIONS: &[Operation] = &[
    Operation::new("size", &[], "usize"),
    Operation::new("read", &["usize"], "Option<Cell>"),
    Operation::new("write", &["usize", "Cell"], "bool"),
];

impl<C: 'static> ContextContract for dyn MemoryContext<C> {
    const DESCRIPTOR: ContractDescriptor =
        ContractDescriptor::contract("memory", ContextFamily::Memory)
            .with_operations(MEMORY_OPERATIONS);

    fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
        this
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// Capability offered by an I/O device, generic over the transferred data.
pub trait DeviceContext<D>: Context {
    fn read_data(&self) -> D;

    fn write_data(&self, data: D);
}

const DEVICE_OPERATIONS: &[Operation] = &[
    Operation::new("read_data", &[], "Data"),
    Operation::new("write_data", &["Data"], "()"),
];

impl<D: 'static> ContextContract for dyn DeviceContext<D> {
    const DESCRIPTOR: ContractDescriptor =
        ContractDescriptor::contract("device", ContextFamily::Device)
            .with_operations(DEVICE_OPERATIONS);

    fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
        this
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Capability offered by a compiler. Carries no operations of its own.
pub trait CompilerContext: Context {}

impl ContextContract for dyn CompilerContext {
    const DESCRIPTOR: ContractDescriptor =
        ContractDescriptor::contract("compiler", ContextFamily::Compiler);

    fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
        this
    }
}
