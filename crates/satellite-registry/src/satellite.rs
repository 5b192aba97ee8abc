//! The satellite aggregate exposed to planners and the route cache

use crate::processor::{ProcessorHandle, ProcessorId};
use network_core::{Antenna, Endpoint, EndpointKind, NodeId};
use std::fmt;

/// Comms capability of one node, derived from the processors registered
/// under its id.
#[derive(Debug, Clone)]
pub struct Satellite {
    id: NodeId,
    processors: Vec<ProcessorHandle>,
}

impl Satellite {
    pub(crate) fn new(id: NodeId, processors: Vec<ProcessorHandle>) -> Self {
        Self { id, processors }
    }

    pub fn processors(&self) -> &[ProcessorHandle] {
        &self.processors
    }

    pub fn processor(&self, id: ProcessorId) -> Option<&ProcessorHandle> {
        self.processors.iter().find(|p| p.id() == id)
    }

    pub fn contains(&self, id: ProcessorId) -> bool {
        self.processor(id).is_some()
    }

    pub fn is_powered(&self) -> bool {
        self.processors.iter().any(|p| p.powered())
    }

    pub(crate) fn push(&mut self, processor: ProcessorHandle) {
        self.processors.push(processor);
    }

    /// Returns whether the processor was present.
    pub(crate) fn remove(&mut self, id: ProcessorId) -> bool {
        let before = self.processors.len();
        self.processors.retain(|p| p.id() != id);
        self.processors.len() != before
    }
}

impl Endpoint for Satellite {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        self.processors.first().map(|p| p.name()).unwrap_or_default()
    }

    fn kind(&self) -> EndpointKind {
        EndpointKind::Satellite
    }

    fn antennas(&self) -> Box<dyn Iterator<Item = &Antenna> + '_> {
        Box::new(self.processors.iter().flat_map(|p| p.antennas().iter()))
    }

    fn is_command_station(&self) -> bool {
        self.processors.iter().any(|p| p.is_command_station())
    }
}

impl fmt::Display for Satellite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Satellite({}, {}, processors: {})",
            self.name(),
            self.id,
            self.processors.len()
        )
    }
}
