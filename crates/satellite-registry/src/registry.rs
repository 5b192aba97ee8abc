//! Satellite registry
//!
//! Maps every node id to exactly one of:
//!
//! - `Live`: one or more processors from a loaded vessel
//! - `Dormant`: a single proto processor from the vessel snapshot
//! - absent: the node has no comms capability
//!
//! Entering `Live` always clears `Dormant` first; leaving `Live` tries to
//! fall back to `Dormant`. All calls are synchronous and expected on the
//! host's update tick.

use crate::processor::{ProcessorHandle, ProcessorId};
use crate::satellite::Satellite;
use crate::vessel::VesselSource;
use network_core::{Endpoint, NodeId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Which representation currently backs a node's satellite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Live,
    Dormant,
}

enum NodeEntry {
    Live(Satellite),
    Dormant(Satellite),
}

impl NodeEntry {
    fn satellite(&self) -> &Satellite {
        match self {
            NodeEntry::Live(sat) | NodeEntry::Dormant(sat) => sat,
        }
    }

    fn representation(&self) -> Representation {
        match self {
            NodeEntry::Live(_) => Representation::Live,
            NodeEntry::Dormant(_) => Representation::Dormant,
        }
    }
}

/// Published on every satellite creation and destruction
#[derive(Debug, Clone, Copy)]
pub enum RegistryEvent<'a> {
    Registered(&'a Satellite),
    Unregistered(&'a Satellite),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&RegistryEvent<'_>)>;

pub struct SatelliteRegistry<S: VesselSource> {
    entries: HashMap<NodeId, NodeEntry>,
    /// Destruction subscriptions: processor -> key it was registered under
    subscriptions: HashMap<ProcessorId, NodeId>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    source: S,
}

impl<S: VesselSource> SatelliteRegistry<S> {
    pub fn new(source: S) -> Self {
        Self {
            entries: HashMap::new(),
            subscriptions: HashMap::new(),
            listeners: Vec::new(),
            next_listener: 0,
            source,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the snapshot source. Changes take effect on the
    /// next `register_proto` for the affected node.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&RegistryEvent<'_>) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    /// Register a live processor. Returns the key it was filed under.
    pub fn register(&mut self, spu: ProcessorHandle) -> NodeId {
        let key = spu.guid();
        debug!("SatelliteRegistry: register({}, {})", key, spu.id());

        if !self.is_live(key) {
            self.teardown_dormant(key);
        }

        match self.entries.get_mut(&key) {
            Some(NodeEntry::Live(sat)) => {
                if sat.contains(spu.id()) {
                    return key;
                }
                sat.push(spu.clone());
            }
            _ => {
                self.entries
                    .insert(key, NodeEntry::Live(Satellite::new(key, vec![spu.clone()])));
                if let Some(entry) = self.entries.get(&key) {
                    notify(&mut self.listeners, &RegistryEvent::Registered(entry.satellite()));
                }
            }
        }

        self.subscriptions.insert(spu.id(), key);
        key
    }

    /// Unregister a processor under its current identity key.
    pub fn unregister_processor(&mut self, spu: &ProcessorHandle) {
        self.unregister(spu.guid(), spu);
    }

    /// Remove a processor from the live set filed under `key`.
    pub fn unregister(&mut self, key: NodeId, spu: &ProcessorHandle) {
        debug!("SatelliteRegistry: unregister({}, {})", key, spu.id());

        let Some(NodeEntry::Live(sat)) = self.entries.get_mut(&key) else {
            return;
        };
        if !sat.remove(spu.id()) {
            return;
        }
        let emptied = sat.processors().is_empty();
        self.release_subscription(spu.id(), key);

        if emptied {
            if let Some(entry) = self.entries.remove(&key) {
                notify(&mut self.listeners, &RegistryEvent::Unregistered(entry.satellite()));
            }
            // The vessel may only have gone out of physics range.
            self.register_proto(key);
        }
    }

    /// (Re)build the dormant satellite for `node` from its snapshot.
    pub fn register_proto(&mut self, node: NodeId) {
        debug!("SatelliteRegistry: register_proto({})", node);
        if self.is_live(node) {
            return;
        }

        let processor = self.source.dormant_processor(node);
        self.teardown_dormant(node);

        if let Some(processor) = processor {
            self.entries
                .insert(node, NodeEntry::Dormant(Satellite::new(node, vec![processor])));
            if let Some(entry) = self.entries.get(&node) {
                notify(&mut self.listeners, &RegistryEvent::Registered(entry.satellite()));
            }
        }
    }

    pub fn unregister_proto(&mut self, node: NodeId) {
        debug!("SatelliteRegistry: unregister_proto({})", node);
        if self.is_live(node) {
            return;
        }
        self.teardown_dormant(node);
    }

    /// Re-file processors whose identity key moved since registration.
    ///
    /// Returns the number of processors moved.
    pub fn resync(&mut self) -> usize {
        let snapshot: Vec<(NodeId, Vec<ProcessorHandle>)> = self
            .entries
            .iter()
            .filter_map(|(key, entry)| match entry {
                NodeEntry::Live(sat) => Some((*key, sat.processors().to_vec())),
                NodeEntry::Dormant(_) => None,
            })
            .collect();

        let mut moved = 0;
        for (key, processors) in snapshot {
            for spu in processors {
                if spu.guid() != key {
                    self.unregister(key, &spu);
                    self.register(spu);
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Satellites, live or dormant, that can issue commands.
    pub fn find_command_stations(&self) -> impl Iterator<Item = &Satellite> + '_ {
        self.entries
            .values()
            .map(NodeEntry::satellite)
            .filter(|sat| sat.is_command_station())
    }

    pub fn node_created(&mut self, node: NodeId) {
        debug!("SatelliteRegistry: node_created({})", node);
    }

    pub fn node_destroyed(&mut self, node: NodeId) {
        debug!("SatelliteRegistry: node_destroyed({})", node);

        let orphaned = match self.entries.get(&node) {
            Some(NodeEntry::Live(sat)) => Some(sat.processors().len()),
            _ => None,
        };
        if let Some(count) = orphaned {
            warn!(
                "Node {} destroyed with {} live processor(s) still registered, clearing",
                node, count
            );
            if let Some(entry) = self.entries.remove(&node) {
                for processor in entry.satellite().processors() {
                    self.release_subscription(processor.id(), node);
                }
                notify(&mut self.listeners, &RegistryEvent::Unregistered(entry.satellite()));
            }
        }

        self.unregister_proto(node);
    }

    /// Destruction notification for a processor we hold a subscription for.
    pub fn processor_destroyed(&mut self, id: ProcessorId) {
        let Some(key) = self.subscriptions.get(&id).copied() else {
            debug!("SatelliteRegistry: no subscription for destroyed {}", id);
            return;
        };

        let processor = match self.entries.get(&key) {
            Some(NodeEntry::Live(sat)) => sat.processor(id).cloned(),
            _ => None,
        };

        match processor {
            Some(spu) => self.unregister(key, &spu),
            None => {
                self.subscriptions.remove(&id);
            }
        }
    }

    /// Session end: drop every satellite, subscription and listener.
    pub fn teardown(&mut self) {
        let keys: Vec<NodeId> = self.entries.keys().copied().collect();
        for key in keys {
            if let Some(entry) = self.entries.remove(&key) {
                notify(&mut self.listeners, &RegistryEvent::Unregistered(entry.satellite()));
            }
        }
        self.subscriptions.clear();
        self.listeners.clear();
    }

    pub fn get(&self, id: NodeId) -> Option<&Satellite> {
        self.entries.get(&id).map(NodeEntry::satellite)
    }

    pub fn representation(&self, id: NodeId) -> Option<Representation> {
        self.entries.get(&id).map(NodeEntry::representation)
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        matches!(self.entries.get(&id), Some(NodeEntry::Live(_)))
    }

    pub fn is_dormant(&self, id: NodeId) -> bool {
        matches!(self.entries.get(&id), Some(NodeEntry::Dormant(_)))
    }

    /// Key the processor's destruction notification is bound to, if any.
    pub fn subscription(&self, id: ProcessorId) -> Option<NodeId> {
        self.subscriptions.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Satellite> + '_ {
        self.entries.values().map(NodeEntry::satellite)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn teardown_dormant(&mut self, node: NodeId) -> bool {
        if !self.is_dormant(node) {
            return false;
        }
        if let Some(entry) = self.entries.remove(&node) {
            notify(&mut self.listeners, &RegistryEvent::Unregistered(entry.satellite()));
        }
        true
    }

    fn release_subscription(&mut self, id: ProcessorId, key: NodeId) {
        if self.subscriptions.get(&id) == Some(&key) {
            self.subscriptions.remove(&id);
        }
    }
}

fn notify(listeners: &mut [(ListenerId, Listener)], event: &RegistryEvent<'_>) {
    match event {
        RegistryEvent::Registered(sat) => debug!("SatelliteRegistry: on_register({})", sat),
        RegistryEvent::Unregistered(sat) => debug!("SatelliteRegistry: on_unregister({})", sat),
    }
    for (_, listener) in listeners.iter_mut() {
        listener(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{LiveProcessor, SignalProcessor};
    use crate::vessel::{VesselCatalog, VesselSnapshot};
    use network_core::Antenna;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Seen {
        Registered(NodeId),
        Unregistered(NodeId),
    }

    fn node(n: u128) -> NodeId {
        NodeId::from_u128(n)
    }

    fn spu(part_id: u32, vessel: NodeId) -> Rc<LiveProcessor> {
        Rc::new(LiveProcessor::new(
            part_id,
            vessel,
            format!("Vessel {}", vessel),
            false,
            vec![Antenna::omni(vessel, part_id + 1000, "Whip", 2_500_000.0)],
        ))
    }

    fn handle(spu: &Rc<LiveProcessor>) -> ProcessorHandle {
        spu.clone()
    }

    fn with_snapshot(id: NodeId) -> VesselCatalog {
        let mut catalog = VesselCatalog::new();
        let mut snapshot = VesselSnapshot::new(id, "Dormant Relay");
        snapshot.has_processor = true;
        catalog.insert(snapshot);
        catalog
    }

    fn recorded(
        registry: &mut SatelliteRegistry<VesselCatalog>,
    ) -> Rc<RefCell<Vec<Seen>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        registry.subscribe(move |event| {
            sink.borrow_mut().push(match event {
                RegistryEvent::Registered(sat) => Seen::Registered(sat.id()),
                RegistryEvent::Unregistered(sat) => Seen::Unregistered(sat.id()),
            })
        });
        seen
    }

    #[test]
    fn test_register_new_node() {
        let g = node(1);
        let mut registry = SatelliteRegistry::new(VesselCatalog::new());
        let seen = recorded(&mut registry);

        let key = registry.register(handle(&spu(1, g)));

        assert_eq!(key, g);
        assert_eq!(*seen.borrow(), vec![Seen::Registered(g)]);
        assert!(registry.get(g).is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.representation(g), Some(Representation::Live));
    }

    #[test]
    fn test_second_processor_joins_existing_satellite() {
        let g = node(1);
        let mut registry = SatelliteRegistry::new(VesselCatalog::new());
        let seen = recorded(&mut registry);

        registry.register(handle(&spu(1, g)));
        registry.register(handle(&spu(2, g)));

        assert_eq!(seen.borrow().len(), 1);
        let sat = registry.get(g).unwrap();
        assert!(sat.contains(ProcessorId::Part(1)));
        assert!(sat.contains(ProcessorId::Part(2)));
        assert_eq!(sat.antennas().count(), 2);
    }

    #[test]
    fn test_double_register_is_idempotent() {
        let g = node(1);
        let a = spu(1, g);
        let mut registry = SatelliteRegistry::new(VesselCatalog::new());
        let seen = recorded(&mut registry);

        registry.register(handle(&a));
        registry.register(handle(&a));

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(registry.get(g).unwrap().processors().len(), 1);
    }

    #[test]
    fn test_unregister_falls_back_to_dormant() {
        let g = node(1);
        let a = spu(1, g);
        let mut registry = SatelliteRegistry::new(with_snapshot(g));
        registry.register(handle(&a));
        let seen = recorded(&mut registry);

        registry.unregister_processor(&handle(&a));

        assert_eq!(
            *seen.borrow(),
            vec![Seen::Unregistered(g), Seen::Registered(g)]
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.representation(g), Some(Representation::Dormant));
        assert_eq!(registry.subscription(ProcessorId::Part(1)), None);
    }

    #[test]
    fn test_register_unregister_restores_absent() {
        let g = node(1);
        let a = spu(1, g);
        let mut registry = SatelliteRegistry::new(VesselCatalog::new());

        registry.register(handle(&a));
        registry.unregister(g, &handle(&a));

        assert!(registry.get(g).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_replaces_dormant() {
        let g = node(1);
        let mut registry = SatelliteRegistry::new(with_snapshot(g));
        registry.register_proto(g);
        assert!(registry.is_dormant(g));
        let seen = recorded(&mut registry);

        registry.register(handle(&spu(1, g)));

        assert_eq!(
            *seen.borrow(),
            vec![Seen::Unregistered(g), Seen::Registered(g)]
        );
        assert!(registry.is_live(g));
        assert!(!registry.is_dormant(g));
    }

    #[test]
    fn test_proto_never_overrides_live() {
        let g = node(1);
        let mut registry = SatelliteRegistry::new(with_snapshot(g));
        registry.register(handle(&spu(1, g)));
        let seen = recorded(&mut registry);

        registry.register_proto(g);
        registry.unregister_proto(g);

        assert!(seen.borrow().is_empty());
        assert!(registry.is_live(g));
    }

    #[test]
    fn test_unregister_proto_without_entry_is_noop() {
        let mut registry = SatelliteRegistry::new(VesselCatalog::new());
        let seen = recorded(&mut registry);

        registry.unregister_proto(node(5));
        registry.unregister(node(5), &handle(&spu(1, node(5))));

        assert!(seen.borrow().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_proto_without_hardware_removes_satellite() {
        let g = node(1);
        let mut registry = SatelliteRegistry::new(with_snapshot(g));
        registry.register_proto(g);
        assert!(registry.is_dormant(g));

        registry.source_mut().remove(g);
        registry.register_proto(g);

        assert!(registry.get(g).is_none());
    }

    #[test]
    fn test_resync_moves_docked_processor() {
        let a_id = node(1);
        let b_id = node(2);
        let a = spu(1, a_id);
        let b = spu(2, b_id);
        let mut registry = SatelliteRegistry::new(VesselCatalog::new());
        registry.register(handle(&a));
        registry.register(handle(&b));

        // b docks with a; a's vessel id survives
        b.transfer_to(a_id);
        let moved = registry.resync();

        assert_eq!(moved, 1);
        assert!(registry.get(b_id).is_none());
        let sat = registry.get(a_id).unwrap();
        assert_eq!(sat.processors().len(), 2);
        assert_eq!(registry.subscription(ProcessorId::Part(2)), Some(a_id));
        assert_eq!(registry.resync(), 0);
    }

    #[test]
    fn test_processor_destroyed_uses_bound_key() {
        let g = node(1);
        let a = spu(1, g);
        let mut registry = SatelliteRegistry::new(VesselCatalog::new());
        registry.register(handle(&a));

        // guid drifts before the tick; destruction still hits the original key
        a.transfer_to(node(2));
        registry.processor_destroyed(ProcessorId::Part(1));

        assert!(registry.is_empty());
        assert_eq!(registry.subscription(ProcessorId::Part(1)), None);
    }

    #[test]
    fn test_node_destroyed_clears_orphaned_live_set() {
        let g = node(1);
        let mut registry = SatelliteRegistry::new(with_snapshot(g));
        registry.register(handle(&spu(1, g)));
        let seen = recorded(&mut registry);

        registry.node_destroyed(g);

        assert_eq!(*seen.borrow(), vec![Seen::Unregistered(g)]);
        assert!(registry.get(g).is_none());
        assert_eq!(registry.subscription(ProcessorId::Part(1)), None);
    }

    #[test]
    fn test_find_command_stations() {
        let mut catalog = VesselCatalog::new();
        let mut station = VesselSnapshot::new(node(3), "Station");
        station.has_processor = true;
        station.command_station = true;
        catalog.insert(station);

        let mut registry = SatelliteRegistry::new(catalog);
        registry.register(handle(&spu(1, node(1))));
        registry.register(Rc::new(LiveProcessor::new(
            2,
            node(2),
            "Command Pod",
            true,
            Vec::new(),
        )));
        registry.register_proto(node(3));

        let mut ids: Vec<NodeId> = registry.find_command_stations().map(|s| s.id()).collect();
        ids.sort();
        assert_eq!(ids, vec![node(2), node(3)]);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut registry = SatelliteRegistry::new(with_snapshot(node(2)));
        registry.register(handle(&spu(1, node(1))));
        registry.register_proto(node(2));
        let seen = recorded(&mut registry);

        registry.teardown();

        assert_eq!(seen.borrow().len(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.subscription(ProcessorId::Part(1)), None);
        assert!(!registry.unsubscribe(ListenerId(0)));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Register(usize),
            Unregister(usize),
            RegisterProto(u128),
            UnregisterProto(u128),
            Transfer(usize, u128),
            Resync,
            Destroyed(usize),
            NodeDestroyed(u128),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..4).prop_map(Op::Register),
                (0usize..4).prop_map(Op::Unregister),
                (1u128..4).prop_map(Op::RegisterProto),
                (1u128..4).prop_map(Op::UnregisterProto),
                ((0usize..4), (1u128..4)).prop_map(|(s, n)| Op::Transfer(s, n)),
                Just(Op::Resync),
                (0usize..4).prop_map(Op::Destroyed),
                (1u128..4).prop_map(Op::NodeDestroyed),
            ]
        }

        proptest! {
            #[test]
            fn test_one_satellite_per_node(ops in prop::collection::vec(op(), 1..40)) {
                let mut catalog = VesselCatalog::new();
                for n in 1..4 {
                    let mut snapshot = VesselSnapshot::new(node(n), "Snapshot");
                    snapshot.has_processor = n != 3;
                    catalog.insert(snapshot);
                }
                let processors: Vec<Rc<LiveProcessor>> =
                    (0..4).map(|i| spu(i as u32, node(1 + (i as u128 % 3)))).collect();

                let mut registry = SatelliteRegistry::new(catalog);
                let balance = Rc::new(RefCell::new(HashMap::<NodeId, i32>::new()));
                let sink = balance.clone();
                registry.subscribe(move |event| {
                    let mut counts = sink.borrow_mut();
                    match event {
                        RegistryEvent::Registered(sat) => *counts.entry(sat.id()).or_default() += 1,
                        RegistryEvent::Unregistered(sat) => *counts.entry(sat.id()).or_default() -= 1,
                    }
                });

                for op in ops {
                    match op {
                        Op::Register(i) => { registry.register(handle(&processors[i])); }
                        Op::Unregister(i) => registry.unregister_processor(&handle(&processors[i])),
                        Op::RegisterProto(n) => registry.register_proto(node(n)),
                        Op::UnregisterProto(n) => registry.unregister_proto(node(n)),
                        Op::Transfer(i, n) => processors[i].transfer_to(node(n)),
                        Op::Resync => { registry.resync(); }
                        Op::Destroyed(i) => registry.processor_destroyed(processors[i].id()),
                        Op::NodeDestroyed(n) => registry.node_destroyed(node(n)),
                    }

                    for n in 1..4 {
                        let id = node(n);
                        prop_assert!(!(registry.is_live(id) && registry.is_dormant(id)));
                        // events balance to exactly the satellites that exist
                        let expected = i32::from(registry.get(id).is_some());
                        prop_assert_eq!(balance.borrow().get(&id).copied().unwrap_or(0), expected);
                    }
                    for sat in registry.iter() {
                        prop_assert!(!sat.processors().is_empty());
                    }
                }
            }
        }
    }
}
