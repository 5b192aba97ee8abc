//! Beam Routing Library
//!
//! Multi-hop signal routes through the relay network:
//!
//! - `Link`: one hop with its transmitting and receiving antennas
//! - `Route`: a chain of links from a source to a command station
//! - `PathPlanner`: reference Dijkstra planner over the capability graph
//! - `NetworkView`: joins the satellite and station registries into one
//!   `NetworkDirectory`

use network_core::NodeId;
use thiserror::Error;

pub mod link;
pub mod network;
pub mod planner;
pub mod range;
pub mod route;

pub use link::{AntennaRole, Link};
pub use network::NetworkView;
pub use network_core::LinkPort;
pub use planner::{PathPlanner, PlannerConfig};
pub use range::{Occluder, RangeModel, StaticRangeModel};
pub use route::Route;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Route has no links")]
    EmptyRoute,
    #[error("Link to {target} has no {role} antennas")]
    EmptyAntennaSet { target: NodeId, role: AntennaRole },
    #[error("Invalid link cost: {0}")]
    InvalidCost(f64),
    #[error("Invalid route delay: {0}")]
    InvalidDelay(f64),
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),
    #[error("Invalid signal speed: {0} m/s")]
    InvalidSignalSpeed(f64),
}

pub type Result<T> = std::result::Result<T, RoutingError>;

/// Costs and delays must be finite and non-negative.
pub(crate) fn is_valid_scalar(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
