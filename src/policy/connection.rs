//! Connection graph: decides which components may see which.
//!
//! Edges are directional: `A` may read `B`'s contexts iff
//! `is_connected(A, B)`. The reverse edge is independent.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::component::ComponentId;

/// Directed visibility policy consulted on every cross-component lookup.
pub trait ConnectionGraph: Send + Sync {
    /// May `requester` see `owner`'s contexts?
    fn is_connected(&self, requester: ComponentId, owner: ComponentId) -> bool;
}

impl<G: ConnectionGraph + ?Sized> ConnectionGraph for Arc<G> {
    fn is_connected(&self, requester: ComponentId, owner: ComponentId) -> bool {
        (**self).is_connected(requester, owner)
    }
}

impl<G: ConnectionGraph + ?Sized> ConnectionGraph for Box<G> {
    fn is_connected(&self, requester: ComponentId, owner: ComponentId) -> bool {
        (**self).is_connected(requester, owner)
    }
}

/// Every component sees every other.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullyConnected;

impl ConnectionGraph for FullyConnected {
    fn is_connected(&self, _requester: ComponentId, _owner: ComponentId) -> bool {
        true
    }
}

/// No component sees any other.
#[derive(Debug, Clone, Copy, Default)]
pub struct Isolated;

impl ConnectionGraph for Isolated {
    fn is_connected(&self, _requester: ComponentId, _owner: ComponentId) -> bool {
        false
    }
}

/// Adapter for a plain function or closure.
pub struct FnConnection<F>(F);

/// Wrap a closure as a [`ConnectionGraph`].
pub fn from_fn<F>(f: F) -> FnConnection<F>
where
    F: Fn(ComponentId, ComponentId) -> bool + Send + Sync,
{
    FnConnection(f)
}

impl<F> ConnectionGraph for FnConnection<F>
where
    F: Fn(ComponentId, ComponentId) -> bool + Send + Sync,
{
    fn is_connected(&self, requester: ComponentId, owner: ComponentId) -> bool {
        (self.0)(requester, owner)
    }
}

/// Mutable directed edge set, for hosts that build the wiring at runtime.
///
/// Shared with the registry through an `Arc`; edits take effect on the next
/// lookup.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    /// requester → owners it may see
    edges: RwLock<HashMap<ComponentId, HashSet<ComponentId>>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `requester` see `owner`.
    pub fn connect(&self, requester: ComponentId, owner: ComponentId) {
        self.edges.write().entry(requester).or_default().insert(owner);
    }

    /// Connect in both directions.
    pub fn connect_both(&self, a: ComponentId, b: ComponentId) {
        let mut edges = self.edges.write();
        edges.entry(a).or_default().insert(b);
        edges.entry(b).or_default().insert(a);
    }

    /// Remove one directed edge. Returns whether it existed.
    pub fn disconnect(&self, requester: ComponentId, owner: ComponentId) -> bool {
        let mut edges = self.edges.write();
        match edges.get_mut(&requester) {
            Some(owners) => {
                let removed = owners.remove(&owner);
                if owners.is_empty() {
                    edges.remove(&requester);
                }
                removed
            }
            None => false,
        }
    }

    /// Drop every edge touching `component`, in either direction.
    pub fn remove_component(&self, component: ComponentId) {
        let mut edges = self.edges.write();
        edges.remove(&component);
        edges.retain(|_, owners| {
            owners.remove(&component);
            !owners.is_empty()
        });
    }

    /// Owners visible to `requester`, sorted.
    pub fn visible_from(&self, requester: ComponentId) -> Vec<ComponentId> {
        let mut owners: Vec<ComponentId> = self
            .edges
            .read()
            .get(&requester)
            .map(|owners| owners.iter().copied().collect())
            .unwrap_or_default();
        owners.sort();
        owners
    }

    pub fn edge_count(&self) -> usize {
        self.edges.read().values().map(HashSet::len).sum()
    }
}

impl ConnectionGraph for ConnectionTable {
    fn is_connected(&self, requester: ComponentId, owner: ComponentId) -> bool {
        self.edges
            .read()
            .get(&requester)
            .map(|owners| owners.contains(&owner))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ComponentId {
        ComponentId(n)
    }

    #[test]
    fn test_edges_are_directional() {
        let table = ConnectionTable::new();
        table.connect(id(2), id(1));

        assert!(table.is_connected(id(2), id(1)));
        assert!(!table.is_connected(id(1), id(2)));
    }

    #[test]
    fn test_connect_both() {
        let table = ConnectionTable::new();
        table.connect_both(id(1), id(2));

        assert!(table.is_connected(id(1), id(2)));
        assert!(table.is_connected(id(2), id(1)));
        assert_eq!(table.edge_count(), 2);
    }

    #[test]
    fn test_disconnect() {
        let table = ConnectionTable::new();
        table.connect(id(1), id(2));

        assert!(table.disconnect(id(1), id(2)));
        assert!(!table.disconnect(id(1), id(2)));
        assert!(!table.is_connected(id(1), id(2)));
        assert_eq!(table.edge_count(), 0);
    }

    #[test]
    fn test_remove_component() {
        let table = ConnectionTable::new();
        table.connect(id(1), id(2));
        table.connect(id(3), id(2));
        table.connect(id(3), id(4));
        table.connect(id(2), id(4));

        table.remove_component(id(2));

        assert_eq!(table.visible_from(id(1)), Vec::<ComponentId>::new());
        assert_eq!(table.visible_from(id(3)), vec![id(4)]);
        assert!(!table.is_connected(id(2), id(4)));
    }

    #[test]
    fn test_fixed_graphs() {
        assert!(FullyConnected.is_connected(id(1), id(2)));
        assert!(!Isolated.is_connected(id(1), id(2)));
    }

    #[test]
    fn test_from_fn_and_arc() {
        let graph = from_fn(|requester: ComponentId, owner: ComponentId| requester.0 > owner.0);
        assert!(graph.is_connected(id(2), id(1)));
        assert!(!graph.is_connected(id(1), id(2)));

        let shared = Arc::new(ConnectionTable::new());
        shared.connect(id(5), id(6));
        let as_graph: Arc<dyn ConnectionGraph> = shared.clone();
        assert!(as_graph.is_connected(id(5), id(6)));
    }
}
