//! Network Core Library
//!
//! Shared vocabulary for the relay network:
//!
//! - Node identities (`NodeId`) for vessels and ground stations
//! - Antenna hardware capabilities and their persisted references
//! - The `Endpoint` view every routable node exposes
//! - The `NetworkDirectory` lookup used by planners and the route cache

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub mod antenna;

pub use antenna::{parse_part_id, Antenna, AntennaRef, LinkPort};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid node id: {0}")]
    InvalidNodeId(String),
    #[error("Invalid antenna part id: {0}")]
    InvalidPartId(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Process-stable identity of a vessel or ground station.
///
/// Always supplied by the host; nothing in this workspace mints new ids
/// outside of tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for NodeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| CoreError::InvalidNodeId(s.to_string()))
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Kind of node at either end of a link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Satellite,
    GroundStation,
}

/// Value snapshot of an endpoint, held by links and routes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRef {
    pub id: NodeId,
    pub name: String,
    pub kind: EndpointKind,
}

impl NodeRef {
    pub fn new(id: NodeId, name: impl Into<String>, kind: EndpointKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A routable node: anything that can be the source, hop or goal of a route.
pub trait Endpoint {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    fn kind(&self) -> EndpointKind;

    /// All antennas currently fitted, active or not.
    fn antennas(&self) -> Box<dyn Iterator<Item = &Antenna> + '_>;

    /// Whether this node may issue commands (a valid route goal).
    fn is_command_station(&self) -> bool;

    /// Find an antenna by its part-level identity.
    fn antenna(&self, part_id: u32) -> Option<&Antenna> {
        self.antennas().find(|a| a.part_id == part_id)
    }

    fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.id(), self.name(), self.kind())
    }
}

/// Read-only lookup over every endpoint known to the current session.
pub trait NetworkDirectory {
    /// A registered satellite, live or dormant.
    fn satellite(&self, id: NodeId) -> Option<&dyn Endpoint>;

    fn ground_station(&self, id: NodeId) -> Option<&dyn Endpoint>;

    /// All endpoints, satellites first.
    fn endpoints(&self) -> Vec<&dyn Endpoint>;

    /// Satellites take precedence over ground stations sharing an id.
    fn resolve(&self, id: NodeId) -> Option<&dyn Endpoint> {
        self.satellite(id).or_else(|| self.ground_station(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_parse_forms() {
        let hyphenated: NodeId = "5105f5a9-d628-41c6-ad4b-21154e8fc488".parse().unwrap();
        let simple: NodeId = "5105f5a9d62841c6ad4b21154e8fc488".parse().unwrap();

        assert_eq!(hyphenated, simple);
        assert_eq!(simple.to_string(), "5105f5a9-d628-41c6-ad4b-21154e8fc488");
    }

    #[test]
    fn test_node_id_rejects_garbage() {
        let err = "not-a-guid".parse::<NodeId>().unwrap_err();
        assert_eq!(err, CoreError::InvalidNodeId("not-a-guid".to_string()));
        assert!("".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_ref_display() {
        let node = NodeRef::new(NodeId::from_u128(1), "Relay 1", EndpointKind::Satellite);
        assert_eq!(
            node.to_string(),
            "Relay 1 (00000000-0000-0000-0000-000000000001)"
        );
    }
}
