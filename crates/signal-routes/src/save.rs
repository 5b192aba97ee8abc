//! Document form of the route store

use crate::document::ConfigNode;
use crate::{keys, DOCUMENT_NODE, SUPPORTED_VERSION};
use beam_routing::{Link, Route};
use network_core::{AntennaRef, NodeId};
use std::collections::BTreeMap;

/// Writes every non-tombstoned route. Satellites left with none are omitted.
pub(crate) fn write_routes(routes: &BTreeMap<NodeId, Vec<Route>>) -> ConfigNode {
    let mut root = ConfigNode::new(DOCUMENT_NODE);
    root.add_value(keys::VERSION, SUPPORTED_VERSION);

    for (id, list) in routes {
        let mut kept = list.iter().filter(|r| !r.is_tombstoned()).peekable();
        let Some(first) = kept.peek() else {
            continue;
        };

        let mut satellite = ConfigNode::new(keys::SATELLITE);
        satellite.add_value(keys::NAME, &first.source().name);
        satellite.add_value(keys::GUID, id);
        for route in kept {
            satellite.add_node(write_route(route));
        }
        root.add_node(satellite);
    }
    root
}

fn write_route(route: &Route) -> ConfigNode {
    let mut node = ConfigNode::new(keys::ROUTE);
    node.add_value(keys::DELAY, route.delay());
    if let Some(goal) = route.goal() {
        node.add_value(keys::GOAL, goal.id);
    }
    for link in route.links() {
        node.add_node(write_link(link));
    }
    node
}

fn write_link(link: &Link) -> ConfigNode {
    let mut node = ConfigNode::new(keys::LINK);
    node.add_value(keys::COST, link.cost());
    node.add_value(keys::LINK_TYPE, link.port());
    node.add_value(keys::TARGET_NAME, &link.target().name);
    node.add_value(keys::TARGET_GUID, link.target().id);
    for antenna in link.transmitters() {
        node.add_node(write_antenna(keys::TRANSMITTER, antenna));
    }
    for antenna in link.receivers() {
        node.add_node(write_antenna(keys::RECEIVER, antenna));
    }
    node
}

fn write_antenna(name: &str, antenna: &AntennaRef) -> ConfigNode {
    let mut node = ConfigNode::new(name);
    node.add_value(keys::NAME, &antenna.name);
    node.add_value(keys::GUID, antenna.owner);
    node.add_value(keys::PART_ID, antenna.part_id);
    node
}
