//! Last-known vessel state, queried when a node is not simulated

use crate::processor::{ProcessorHandle, ProtoProcessor};
use network_core::{Antenna, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;

/// Hardware snapshot of an unloaded vessel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselSnapshot {
    pub id: NodeId,
    pub name: String,
    /// Vessel carries a signal processor module
    #[serde(default)]
    pub has_processor: bool,
    #[serde(default)]
    pub command_station: bool,
    #[serde(default)]
    pub antennas: Vec<Antenna>,
}

impl VesselSnapshot {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            has_processor: false,
            command_station: false,
            antennas: Vec::new(),
        }
    }
}

/// Node-state query used to synthesize dormant satellites.
pub trait VesselSource {
    fn dormant_processor(&self, vessel: NodeId) -> Option<ProcessorHandle>;
}

/// In-memory store of vessel snapshots
#[derive(Debug, Default)]
pub struct VesselCatalog {
    vessels: HashMap<NodeId, VesselSnapshot>,
}

impl VesselCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot for a vessel.
    pub fn insert(&mut self, snapshot: VesselSnapshot) -> Option<VesselSnapshot> {
        self.vessels.insert(snapshot.id, snapshot)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<VesselSnapshot> {
        self.vessels.remove(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&VesselSnapshot> {
        self.vessels.get(&id)
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

impl VesselSource for VesselCatalog {
    fn dormant_processor(&self, vessel: NodeId) -> Option<ProcessorHandle> {
        let snapshot = self.vessels.get(&vessel)?;
        let proto = ProtoProcessor::from_snapshot(snapshot)?;
        Some(Rc::new(proto))
    }
}
