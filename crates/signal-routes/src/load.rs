//! Validated reconstruction of routes from a document
//!
//! Every level returns `Result<_, SkipReason>`. A failing satellite, route
//! or antenna is dropped and its siblings carry on; a failing link takes its
//! whole route with it. Only document-level problems abort the load.

use crate::document::ConfigNode;
use crate::{keys, LoadError, SUPPORTED_VERSION};
use beam_routing::{AntennaRole, Link, LinkPort, Route};
use network_core::{parse_part_id, AntennaRef, Endpoint, NetworkDirectory, NodeId};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

/// Smallest unit discarded by a skip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipScope {
    Satellite,
    Route,
    Antenna,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    #[error("satellite entry has no guid")]
    MissingSatelliteGuid,

    #[error("invalid {field} '{value}'")]
    InvalidGuid { field: &'static str, value: String },

    #[error("satellite {0} is not registered")]
    UnknownSatellite(NodeId),

    #[error("satellite {0} has no route data")]
    NoRoutes(NodeId),

    #[error("route has no goal")]
    MissingGoal,

    #[error("route goal {0} does not exist")]
    UnknownGoal(NodeId),

    #[error("route has no delay")]
    MissingDelay,

    #[error("route has invalid delay '{0}'")]
    InvalidDelay(String),

    #[error("route has no link data")]
    NoLinks,

    #[error("link has no cost")]
    MissingCost,

    #[error("link has invalid cost '{0}'")]
    InvalidCost(String),

    #[error("link has no target guid")]
    MissingTarget,

    #[error("link target {0} does not exist")]
    UnknownTarget(NodeId),

    #[error("link has no link type")]
    MissingLinkType,

    #[error("link type '{0}' is not recognized")]
    UnknownLinkType(String),

    #[error("link has no {0} data")]
    NoAntennas(AntennaRole),

    #[error("{0} has no part id")]
    MissingPartId(AntennaRole),

    #[error("{role} has invalid part id '{value}'")]
    InvalidPartId { role: AntennaRole, value: String },

    #[error("{role} part {part_id} is not fitted to {node}")]
    UnknownAntenna {
        role: AntennaRole,
        node: NodeId,
        part_id: u32,
    },

    #[error("link to {target} has no usable {role}")]
    EmptyAntennaSet { target: NodeId, role: AntennaRole },

    #[error("route goal {declared} does not match final link target {reached}")]
    GoalMismatch { declared: NodeId, reached: NodeId },

    #[error("route rejected: {0}")]
    Rejected(String),
}

impl SkipReason {
    pub fn scope(&self) -> SkipScope {
        use SkipReason::*;
        match self {
            MissingSatelliteGuid | UnknownSatellite(_) | NoRoutes(_) => SkipScope::Satellite,
            InvalidGuid { field, .. } if *field == keys::GUID => SkipScope::Satellite,
            MissingPartId(_) | InvalidPartId { .. } | UnknownAntenna { .. } => SkipScope::Antenna,
            _ => SkipScope::Route,
        }
    }
}

/// One discarded unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skip {
    pub scope: SkipScope,
    /// Satellite the unit belonged to, when it got that far
    pub satellite: Option<NodeId>,
    pub reason: SkipReason,
}

/// Outcome of one load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub satellites: usize,
    pub routes: usize,
    pub links: usize,
    pub skipped: Vec<Skip>,
    pub aborted: Option<LoadError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.aborted.is_none()
    }

    pub fn skipped_in(&self, scope: SkipScope) -> usize {
        self.skipped.iter().filter(|s| s.scope == scope).count()
    }

    fn skip(&mut self, satellite: Option<NodeId>, reason: SkipReason) {
        let scope = reason.scope();
        match satellite {
            Some(id) => info!("Skipping {:?} of satellite {}: {}", scope, id, reason),
            None => info!("Skipping {:?}: {}", scope, reason),
        }
        self.skipped.push(Skip {
            scope,
            satellite,
            reason,
        });
    }
}

pub(crate) fn read_routes(
    document: &ConfigNode,
    network: &dyn NetworkDirectory,
    report: &mut LoadReport,
) -> Result<BTreeMap<NodeId, Vec<Route>>, LoadError> {
    let version = document.value(keys::VERSION).ok_or(LoadError::MissingVersion)?;
    if version.trim() != SUPPORTED_VERSION {
        return Err(LoadError::UnsupportedVersion(version.to_string()));
    }
    if !document.has_node(keys::SATELLITE) {
        return Err(LoadError::NoSatellites);
    }

    let mut routes = BTreeMap::new();
    for node in document.nodes(keys::SATELLITE) {
        match read_satellite(node, network, report) {
            Ok((id, list)) => {
                report.satellites += 1;
                routes.insert(id, list);
            }
            Err(reason) => report.skip(None, reason),
        }
    }
    Ok(routes)
}

fn read_satellite(
    node: &ConfigNode,
    network: &dyn NetworkDirectory,
    report: &mut LoadReport,
) -> Result<(NodeId, Vec<Route>), SkipReason> {
    let id = read_guid(node, keys::GUID, SkipReason::MissingSatelliteGuid)?;
    let satellite = network.satellite(id).ok_or(SkipReason::UnknownSatellite(id))?;
    if !node.has_node(keys::ROUTE) {
        return Err(SkipReason::NoRoutes(id));
    }

    let mut routes = Vec::new();
    for route_node in node.nodes(keys::ROUTE) {
        match read_route(route_node, id, satellite, network, report) {
            Ok(route) => {
                report.routes += 1;
                report.links += route.hops();
                routes.push(route);
            }
            Err(reason) => report.skip(Some(id), reason),
        }
    }
    Ok((id, routes))
}

fn read_route<'a>(
    node: &ConfigNode,
    owner: NodeId,
    satellite: &'a dyn Endpoint,
    network: &'a dyn NetworkDirectory,
    report: &mut LoadReport,
) -> Result<Route, SkipReason> {
    let goal = read_guid(node, keys::GOAL, SkipReason::MissingGoal)?;
    if network.resolve(goal).is_none() {
        return Err(SkipReason::UnknownGoal(goal));
    }
    let delay = read_scalar(node, keys::DELAY, SkipReason::MissingDelay, SkipReason::InvalidDelay)?;
    if !node.has_node(keys::LINK) {
        return Err(SkipReason::NoLinks);
    }

    // Each hop transmits from where the previous one arrived
    let mut source = satellite;
    let mut links = Vec::new();
    for link_node in node.nodes(keys::LINK) {
        let (link, target) = read_link(link_node, owner, source, network, report)?;
        links.push(link);
        source = target;
    }

    if source.id() != goal {
        return Err(SkipReason::GoalMismatch {
            declared: goal,
            reached: source.id(),
        });
    }

    Route::new(satellite.node_ref(), links, delay).map_err(|e| SkipReason::Rejected(e.to_string()))
}

fn read_link<'a>(
    node: &ConfigNode,
    owner: NodeId,
    source: &'a dyn Endpoint,
    network: &'a dyn NetworkDirectory,
    report: &mut LoadReport,
) -> Result<(Link, &'a dyn Endpoint), SkipReason> {
    let cost = read_scalar(node, keys::COST, SkipReason::MissingCost, SkipReason::InvalidCost)?;
    let target_id = read_guid(node, keys::TARGET_GUID, SkipReason::MissingTarget)?;
    let target = network
        .resolve(target_id)
        .ok_or(SkipReason::UnknownTarget(target_id))?;
    let port: LinkPort = node
        .value(keys::LINK_TYPE)
        .ok_or(SkipReason::MissingLinkType)?
        .parse()
        .map_err(SkipReason::UnknownLinkType)?;

    if !node.has_node(keys::TRANSMITTER) {
        return Err(SkipReason::NoAntennas(AntennaRole::Transmitter));
    }
    if !node.has_node(keys::RECEIVER) {
        return Err(SkipReason::NoAntennas(AntennaRole::Receiver));
    }

    let transmitters = read_antennas(node, AntennaRole::Transmitter, owner, source, report);
    if transmitters.is_empty() {
        return Err(SkipReason::EmptyAntennaSet {
            target: target_id,
            role: AntennaRole::Transmitter,
        });
    }
    let receivers = read_antennas(node, AntennaRole::Receiver, owner, target, report);
    if receivers.is_empty() {
        return Err(SkipReason::EmptyAntennaSet {
            target: target_id,
            role: AntennaRole::Receiver,
        });
    }

    let link = Link::new(target.node_ref(), transmitters, receivers, port, cost)
        .map_err(|e| SkipReason::Rejected(e.to_string()))?;
    Ok((link, target))
}

/// Antennas that fail to resolve are dropped one by one.
fn read_antennas(
    node: &ConfigNode,
    role: AntennaRole,
    owner: NodeId,
    endpoint: &dyn Endpoint,
    report: &mut LoadReport,
) -> Vec<AntennaRef> {
    let key = match role {
        AntennaRole::Transmitter => keys::TRANSMITTER,
        AntennaRole::Receiver => keys::RECEIVER,
    };

    let mut antennas = Vec::new();
    for antenna_node in node.nodes(key) {
        match read_antenna(antenna_node, role, endpoint) {
            Ok(antenna) => antennas.push(antenna),
            Err(reason) => report.skip(Some(owner), reason),
        }
    }
    antennas
}

fn read_antenna(
    node: &ConfigNode,
    role: AntennaRole,
    endpoint: &dyn Endpoint,
) -> Result<AntennaRef, SkipReason> {
    let raw = node.value(keys::PART_ID).ok_or(SkipReason::MissingPartId(role))?;
    let part_id = parse_part_id(raw).map_err(|_| SkipReason::InvalidPartId {
        role,
        value: raw.to_string(),
    })?;
    endpoint
        .antenna(part_id)
        .map(|a| a.to_ref())
        .ok_or(SkipReason::UnknownAntenna {
            role,
            node: endpoint.id(),
            part_id,
        })
}

fn read_guid(node: &ConfigNode, key: &'static str, missing: SkipReason) -> Result<NodeId, SkipReason> {
    let raw = node.value(key).ok_or(missing)?;
    raw.parse().map_err(|_| SkipReason::InvalidGuid {
        field: key,
        value: raw.to_string(),
    })
}

/// Finite, non-negative real.
fn read_scalar(
    node: &ConfigNode,
    key: &str,
    missing: SkipReason,
    invalid: fn(String) -> SkipReason,
) -> Result<f64, SkipReason> {
    let raw = node.value(key).ok_or(missing)?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(invalid(raw.to_string())),
    }
}
