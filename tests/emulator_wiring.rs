//! End-to-end wiring of a small emulator: memory, CPU, and a terminal device,
//! constructed in dependency order by a host that owns the registry.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use plugin_context::context::{
    CapabilityType, Context, ContextContract, ContextFamily, ContractDescriptor, CpuContext,
    DeviceContext, MemoryContext, Operation,
};
use plugin_context::policy::ConnectionTable;
use plugin_context::{
    impl_context, ComponentContexts, ComponentId, ContextRegistry, LookupError, RegistrationError,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

struct Ram {
    cells: Mutex<Vec<u8>>,
}

impl_context!(Ram => dyn MemoryContext<u8>);

impl MemoryContext<u8> for Ram {
    fn size(&self) -> usize {
        self.cells.lock().len()
    }

    fn read(&self, address: usize) -> Option<u8> {
        self.cells.lock().get(address).copied()
    }

    fn write(&self, address: usize, value: u8) -> bool {
        match self.cells.lock().get_mut(address) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }
}

/// Extended CPU contract only the 8080 offers.
trait Intel8080Context: CpuContext {
    fn set_bus_data(&self, data: u8);
    fn bus_data(&self) -> u8;
}

const I8080_OPERATIONS: &[Operation] = &[
    Operation::new("set_bus_data", &["u8"], "()"),
    Operation::new("bus_data", &[], "u8"),
];

impl ContextContract for dyn Intel8080Context {
    const DESCRIPTOR: ContractDescriptor = ContractDescriptor::contract("8080", ContextFamily::Cpu)
        .with_operations(I8080_OPERATIONS)
        .extending(CapabilityType::of::<dyn CpuContext>);

    fn upcast(this: Arc<Self>) -> Arc<dyn Context> {
        this
    }
}

struct Cpu8080 {
    bus: AtomicU8,
    interrupts: Mutex<Vec<(ComponentId, u32)>>,
}

impl_context!(Cpu8080 => dyn Intel8080Context, dyn CpuContext);

impl CpuContext for Cpu8080 {
    fn is_interrupt_supported(&self) -> bool {
        true
    }

    fn signal_interrupt(&self, source: ComponentId, mask: u32) {
        self.interrupts.lock().push((source, mask));
    }
}

impl Intel8080Context for Cpu8080 {
    fn set_bus_data(&self, data: u8) {
        self.bus.store(data, Ordering::SeqCst);
    }

    fn bus_data(&self) -> u8 {
        self.bus.load(Ordering::SeqCst)
    }
}

struct Terminal {
    id: ComponentId,
    cpu: Mutex<Option<Arc<dyn CpuContext>>>,
    last: AtomicU8,
}

impl_context!(Terminal => dyn DeviceContext<u8>);

impl DeviceContext<u8> for Terminal {
    fn read_data(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }

    fn write_data(&self, data: u8) {
        self.last.store(data, Ordering::SeqCst);
        if let Some(cpu) = self.cpu.lock().as_ref() {
            cpu.signal_interrupt(self.id, 1);
        }
    }
}

impl Terminal {
    /// One-time initialization: resolve the CPU the host wired us to.
    fn initialize(&self, contexts: &ComponentContexts, cpu_id: ComponentId) -> Result<(), LookupError> {
        let cpu = contexts.cpu_context::<dyn CpuContext>(cpu_id)?;
        *self.cpu.lock() = Some(cpu);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_host_wires_components_in_dependency_order() {
    init_logging();
    let table = Arc::new(ConnectionTable::new());
    let registry = Arc::new(ContextRegistry::new(table.clone()));

    let memory_id = ComponentId(1);
    let cpu_id = ComponentId(2);
    let terminal_id = ComponentId(3);

    table.connect(cpu_id, memory_id);
    table.connect_both(cpu_id, terminal_id);

    // Construction phase: each component registers its own contexts.
    let memory = registry.scope(memory_id);
    memory
        .register(Arc::new(Ram {
            cells: Mutex::new(vec![0; 16]),
        }) as Arc<dyn MemoryContext<u8>>)
        .unwrap();

    let cpu_scope = registry.scope(cpu_id);
    let cpu = Arc::new(Cpu8080 {
        bus: AtomicU8::new(0),
        interrupts: Mutex::new(Vec::new()),
    });
    cpu_scope.register(cpu.clone() as Arc<dyn Intel8080Context>).unwrap();
    // The same object cannot take a second identity.
    assert!(matches!(
        cpu_scope.register(cpu.clone() as Arc<dyn CpuContext>),
        Err(RegistrationError::AlreadyRegistered { .. })
    ));
    // Registered under the plain CPU contract, a different object is fine.
    let plain_cpu = Arc::new(Cpu8080 {
        bus: AtomicU8::new(0),
        interrupts: Mutex::new(Vec::new()),
    });
    cpu_scope.register(plain_cpu.clone() as Arc<dyn CpuContext>).unwrap();

    let terminal_scope = registry.scope(terminal_id);
    let terminal = Arc::new(Terminal {
        id: terminal_id,
        cpu: Mutex::new(None),
        last: AtomicU8::new(0),
    });
    terminal_scope
        .register(terminal.clone() as Arc<dyn DeviceContext<u8>>)
        .unwrap();

    // Initialization phase.
    let ram = cpu_scope.memory_context::<dyn MemoryContext<u8>>(memory_id).unwrap();
    assert!(ram.write(3, 0x76));
    assert_eq!(ram.read(3), Some(0x76));

    let i8080 = terminal_scope.cpu_context::<dyn Intel8080Context>(cpu_id).unwrap();
    i8080.set_bus_data(0xFF);
    assert_eq!(cpu.bus_data(), 0xFF);

    terminal.initialize(&terminal_scope, cpu_id).unwrap();
    terminal.write_data(b'A');
    assert_eq!(*plain_cpu.interrupts.lock(), vec![(terminal_id, 1)]);

    // The terminal was never wired to memory.
    assert_eq!(
        terminal_scope
            .memory_context::<dyn MemoryContext<u8>>(memory_id)
            .err(),
        Some(LookupError::NotFound)
    );

    // Teardown.
    assert_eq!(registry.clear_owner(terminal_id), 1);
    assert_eq!(registry.clear_owner(cpu_id), 2);
    assert_eq!(registry.clear_owner(memory_id), 1);
    assert!(registry.is_empty());
}

#[test]
fn test_reference_scenario() {
    init_logging();
    let table = Arc::new(ConnectionTable::new());
    let registry = Arc::new(ContextRegistry::new(table.clone()));
    let a = ComponentId(1);
    let b = ComponentId(2);

    let m1: Arc<dyn MemoryContext<u8>> = Arc::new(Ram {
        cells: Mutex::new(vec![0; 4]),
    });
    let c1: Arc<dyn CpuContext> = Arc::new(Cpu8080 {
        bus: AtomicU8::new(1),
        interrupts: Mutex::new(Vec::new()),
    });
    let c2: Arc<dyn CpuContext> = Arc::new(Cpu8080 {
        bus: AtomicU8::new(2),
        interrupts: Mutex::new(Vec::new()),
    });

    registry.register(a, m1.clone()).unwrap();
    registry.register(b, c1.clone()).unwrap();
    registry.register(b, c2.clone()).unwrap();

    table.connect(b, a);

    let got = registry.lookup::<dyn MemoryContext<u8>>(b, a, 0).unwrap();
    assert!(Arc::ptr_eq(&got, &m1));

    assert_eq!(
        registry.lookup::<dyn CpuContext>(a, b, 0).err(),
        Some(LookupError::NotFound)
    );

    let self_lookup = registry.lookup::<dyn CpuContext>(b, b, 1).unwrap();
    assert!(Arc::ptr_eq(&self_lookup, &c2));
}

#[test]
fn test_scoped_unregister_only_touches_own_buckets() {
    let registry = Arc::new(ContextRegistry::new(plugin_context::policy::FullyConnected));
    let first = registry.scope(ComponentId(10));
    let second = registry.scope(ComponentId(11));

    first
        .register(Arc::new(Cpu8080 {
            bus: AtomicU8::new(0),
            interrupts: Mutex::new(Vec::new()),
        }) as Arc<dyn CpuContext>)
        .unwrap();
    second
        .register(Arc::new(Cpu8080 {
            bus: AtomicU8::new(0),
            interrupts: Mutex::new(Vec::new()),
        }) as Arc<dyn CpuContext>)
        .unwrap();

    assert!(second.unregister::<dyn CpuContext>());
    assert!(!second.unregister::<dyn CpuContext>());
    assert!(first.lookup::<dyn CpuContext>(ComponentId(10), 0).is_ok());
    assert!(first.lookup::<dyn CpuContext>(ComponentId(11), 0).is_err());
}

#[test]
fn test_failing_observers_do_not_block_delivery_or_registration() {
    use plugin_context::events::{observer_fn, ObserverError};
    use std::sync::atomic::AtomicUsize;

    init_logging();
    let registry = Arc::new(ContextRegistry::new(plugin_context::policy::FullyConnected));
    let delivered = Arc::new(AtomicUsize::new(0));

    registry.subscribe(Arc::new(observer_fn("panicky", |_| -> Result<(), ObserverError> {
        panic!("observer blew up")
    })));
    registry.subscribe(Arc::new(observer_fn("refusing", |_| Err(ObserverError::new("no")))));
    {
        let delivered = delivered.clone();
        registry.subscribe(Arc::new(observer_fn("counting", move |event| {
            assert_eq!(event.owner(), ComponentId(1));
            delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })));
    }

    let memory: Arc<dyn MemoryContext<u8>> = Arc::new(Ram {
        cells: Mutex::new(vec![0; 2]),
    });
    assert_eq!(registry.register(ComponentId(1), memory.clone()).unwrap(), 0);

    assert_eq!(delivered.load(Ordering::SeqCst), 1);
    assert!(registry.contains_instance(&memory));
}
