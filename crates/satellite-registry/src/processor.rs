//! Signal processors
//!
//! A signal processor (SPU) is the object that represents working comms
//! hardware on a node. Loaded vessels carry `LiveProcessor`s owned by the
//! host simulation; unloaded vessels are stood in for by a `ProtoProcessor`
//! synthesized from their last known snapshot.

use crate::vessel::VesselSnapshot;
use network_core::{Antenna, NodeId};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Stable identity of one processor object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorId {
    /// Processor module on a loaded part
    Part(u32),
    /// Processor synthesized for an unloaded vessel
    Proto(NodeId),
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorId::Part(id) => write!(f, "part:{}", id),
            ProcessorId::Proto(node) => write!(f, "proto:{}", node),
        }
    }
}

pub trait SignalProcessor: fmt::Debug {
    fn id(&self) -> ProcessorId;

    /// Identity key the processor currently answers to. Normally the owning
    /// vessel's id; diverges briefly while ownership moves (docking).
    fn guid(&self) -> NodeId;

    fn vessel_id(&self) -> NodeId;

    fn name(&self) -> &str;

    fn is_command_station(&self) -> bool;

    fn antennas(&self) -> &[Antenna];

    fn powered(&self) -> bool {
        true
    }
}

/// Shared handle; processors are owned by the host and borrowed by the registry.
pub type ProcessorHandle = Rc<dyn SignalProcessor>;

/// Processor module on a loaded vessel
#[derive(Debug)]
pub struct LiveProcessor {
    id: ProcessorId,
    guid: Cell<NodeId>,
    vessel_id: Cell<NodeId>,
    name: String,
    command_station: bool,
    powered: Cell<bool>,
    antennas: Vec<Antenna>,
}

impl LiveProcessor {
    pub fn new(
        part_id: u32,
        vessel_id: NodeId,
        name: impl Into<String>,
        command_station: bool,
        antennas: Vec<Antenna>,
    ) -> Self {
        Self {
            id: ProcessorId::Part(part_id),
            guid: Cell::new(vessel_id),
            vessel_id: Cell::new(vessel_id),
            name: name.into(),
            command_station,
            powered: Cell::new(true),
            antennas,
        }
    }

    /// Move the part to another vessel (dock/undock). The registry notices on
    /// its next resync.
    pub fn transfer_to(&self, vessel_id: NodeId) {
        self.vessel_id.set(vessel_id);
        self.guid.set(vessel_id);
    }

    pub fn set_powered(&self, powered: bool) {
        self.powered.set(powered);
    }

    pub fn into_handle(self) -> ProcessorHandle {
        Rc::new(self)
    }
}

impl SignalProcessor for LiveProcessor {
    fn id(&self) -> ProcessorId {
        self.id
    }

    fn guid(&self) -> NodeId {
        self.guid.get()
    }

    fn vessel_id(&self) -> NodeId {
        self.vessel_id.get()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_command_station(&self) -> bool {
        self.command_station && self.powered.get()
    }

    fn antennas(&self) -> &[Antenna] {
        &self.antennas
    }

    fn powered(&self) -> bool {
        self.powered.get()
    }
}

/// Dormant stand-in built from a vessel snapshot
#[derive(Debug, Clone)]
pub struct ProtoProcessor {
    vessel_id: NodeId,
    name: String,
    command_station: bool,
    antennas: Vec<Antenna>,
}

impl ProtoProcessor {
    /// `None` when the snapshot carries no signal processing hardware.
    pub fn from_snapshot(snapshot: &VesselSnapshot) -> Option<Self> {
        if !snapshot.has_processor {
            return None;
        }
        Some(Self {
            vessel_id: snapshot.id,
            name: snapshot.name.clone(),
            command_station: snapshot.command_station,
            antennas: snapshot.antennas.clone(),
        })
    }
}

impl SignalProcessor for ProtoProcessor {
    fn id(&self) -> ProcessorId {
        ProcessorId::Proto(self.vessel_id)
    }

    fn guid(&self) -> NodeId {
        self.vessel_id
    }

    fn vessel_id(&self) -> NodeId {
        self.vessel_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_command_station(&self) -> bool {
        self.command_station
    }

    fn antennas(&self) -> &[Antenna] {
        &self.antennas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_moves_guid() {
        let from = NodeId::from_u128(1);
        let to = NodeId::from_u128(2);
        let spu = LiveProcessor::new(10, from, "Scout Core", false, Vec::new());

        assert_eq!(spu.guid(), from);
        spu.transfer_to(to);
        assert_eq!(spu.guid(), to);
        assert_eq!(spu.vessel_id(), to);
        assert_eq!(spu.id(), ProcessorId::Part(10));
    }

    #[test]
    fn test_unpowered_processor_cannot_command() {
        let spu = LiveProcessor::new(11, NodeId::from_u128(1), "Command Pod", true, Vec::new());
        assert!(spu.is_command_station());
        spu.set_powered(false);
        assert!(!spu.is_command_station());
    }

    #[test]
    fn test_proto_requires_processor_hardware() {
        let mut snapshot = VesselSnapshot::new(NodeId::from_u128(3), "Debris");
        assert!(ProtoProcessor::from_snapshot(&snapshot).is_none());

        snapshot.has_processor = true;
        let proto = ProtoProcessor::from_snapshot(&snapshot).unwrap();
        assert_eq!(proto.id(), ProcessorId::Proto(NodeId::from_u128(3)));
        assert_eq!(proto.name(), "Debris");
    }
}
