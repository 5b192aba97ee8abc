//! Reference path planner
//!
//! Builds a directed capability graph over every endpoint, then runs
//! Dijkstra from the source and reconstructs one route per reachable
//! command station.
//!
//! Link rules:
//! - Dish: each side has an active dish aimed at the other and the distance
//!   is within the weaker side's best dish range
//! - Omni: both sides have an active omni and the distance is within the
//!   weaker side's best omni range
//!
//! Dish wins when both are possible. Link cost is the hop distance (m).

use crate::link::Link;
use crate::range::RangeModel;
use crate::route::Route;
use crate::{Result, RoutingError};
use network_core::{Antenna, Endpoint, LinkPort, NetworkDirectory, NodeId};
use petgraph::algo::{astar, dijkstra};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Signal propagation speed used for route delay (m/s)
    pub signal_speed_m_s: f64,
    /// Longest accepted route
    pub max_hops: usize,
    /// Routes kept per source, best first
    pub max_routes: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            signal_speed_m_s: SPEED_OF_LIGHT_M_S,
            max_hops: 8,
            max_routes: 3,
        }
    }
}

impl PlannerConfig {
    /// Signal speed must be finite and positive or every delay is garbage.
    pub fn validate(&self) -> Result<()> {
        if !self.signal_speed_m_s.is_finite() || self.signal_speed_m_s <= 0.0 {
            return Err(RoutingError::InvalidSignalSpeed(self.signal_speed_m_s));
        }
        Ok(())
    }
}

struct CapabilityGraph {
    graph: DiGraph<NodeId, Link>,
    node_index: HashMap<NodeId, NodeIndex>,
}

pub struct PathPlanner {
    config: PlannerConfig,
}

impl PathPlanner {
    pub fn new() -> Self {
        Self {
            config: PlannerConfig::default(),
        }
    }

    pub fn with_config(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Best link from `from` to `to` at `distance`, if any.
    pub fn link_between(&self, from: &dyn Endpoint, to: &dyn Endpoint, distance: f64) -> Option<Link> {
        let tx: Vec<&Antenna> = from.antennas().filter(|a| a.can_target(to.id())).collect();
        let rx: Vec<&Antenna> = to.antennas().filter(|a| a.can_target(from.id())).collect();
        if let Some(link) = Self::try_port(to, &tx, &rx, LinkPort::Dish, distance) {
            return Some(link);
        }

        let tx: Vec<&Antenna> = from
            .antennas()
            .filter(|a| a.effective_range(LinkPort::Omni) > 0.0)
            .collect();
        let rx: Vec<&Antenna> = to
            .antennas()
            .filter(|a| a.effective_range(LinkPort::Omni) > 0.0)
            .collect();
        Self::try_port(to, &tx, &rx, LinkPort::Omni, distance)
    }

    fn try_port(
        to: &dyn Endpoint,
        tx: &[&Antenna],
        rx: &[&Antenna],
        port: LinkPort,
        distance: f64,
    ) -> Option<Link> {
        let best = |set: &[&Antenna]| {
            set.iter()
                .map(|a| a.effective_range(port))
                .fold(0.0_f64, f64::max)
        };
        if tx.is_empty() || rx.is_empty() || distance > best(tx).min(best(rx)) {
            return None;
        }
        Link::new(
            to.node_ref(),
            tx.iter().map(|a| a.to_ref()).collect(),
            rx.iter().map(|a| a.to_ref()).collect(),
            port,
            distance,
        )
        .ok()
    }

    fn build_graph(&self, directory: &dyn NetworkDirectory, model: &dyn RangeModel) -> CapabilityGraph {
        let endpoints = directory.endpoints();
        let mut graph = DiGraph::new();
        let mut node_index = HashMap::new();

        for endpoint in &endpoints {
            let idx = graph.add_node(endpoint.id());
            node_index.insert(endpoint.id(), idx);
        }

        for from in &endpoints {
            for to in &endpoints {
                if from.id() == to.id() {
                    continue;
                }
                let Some(distance) = model.distance(from.id(), to.id()) else {
                    continue;
                };
                if let Some(link) = self.link_between(*from, *to, distance) {
                    graph.add_edge(node_index[&from.id()], node_index[&to.id()], link);
                }
            }
        }

        debug!(
            "Capability graph: {} nodes, {} links",
            graph.node_count(),
            graph.edge_count()
        );

        CapabilityGraph { graph, node_index }
    }

    /// Routes from `source` to every reachable command station, fastest first.
    pub fn routes_to_command(
        &self,
        source: NodeId,
        directory: &dyn NetworkDirectory,
        model: &dyn RangeModel,
    ) -> Result<Vec<Route>> {
        let origin = directory
            .resolve(source)
            .ok_or(RoutingError::UnknownNode(source))?;
        let capability = self.build_graph(directory, model);
        self.routes_on(&capability, origin, directory)
    }

    fn routes_on(
        &self,
        capability: &CapabilityGraph,
        origin: &dyn Endpoint,
        directory: &dyn NetworkDirectory,
    ) -> Result<Vec<Route>> {
        let graph = &capability.graph;
        let start = *capability
            .node_index
            .get(&origin.id())
            .ok_or(RoutingError::UnknownNode(origin.id()))?;

        let reachable = dijkstra(graph, start, None, |e| e.weight().cost());

        let mut routes = Vec::new();
        for station in directory.endpoints() {
            if station.id() == origin.id() || !station.is_command_station() {
                continue;
            }
            let Some(&goal) = capability.node_index.get(&station.id()) else {
                continue;
            };
            if !reachable.contains_key(&goal) {
                continue;
            }

            let Some((distance, path)) = astar(
                graph,
                start,
                |n| n == goal,
                |e| e.weight().cost(),
                |_| 0.0,
            ) else {
                continue;
            };
            if path.len().saturating_sub(1) > self.config.max_hops {
                debug!(
                    "Route {} -> {} exceeds {} hops",
                    origin.name(),
                    station.name(),
                    self.config.max_hops
                );
                continue;
            }

            let links: Vec<Link> = path
                .windows(2)
                .filter_map(|w| graph.find_edge(w[0], w[1]))
                .map(|edge| graph[edge].clone())
                .collect();
            let delay = distance / self.config.signal_speed_m_s;
            routes.push(Route::new(origin.node_ref(), links, delay)?);
        }

        routes.sort_by(|a, b| {
            a.delay()
                .partial_cmp(&b.delay())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        routes.truncate(self.config.max_routes);
        Ok(routes)
    }

    /// Plan every satellite in the directory against one shared graph.
    pub fn plan_all(
        &self,
        directory: &dyn NetworkDirectory,
        model: &dyn RangeModel,
    ) -> Result<BTreeMap<NodeId, Vec<Route>>> {
        let capability = self.build_graph(directory, model);
        let mut plan = BTreeMap::new();

        for endpoint in directory.endpoints() {
            if directory.satellite(endpoint.id()).is_none() {
                continue;
            }
            let routes = self.routes_on(&capability, endpoint, directory)?;
            debug!("Planned {} route(s) for {}", routes.len(), endpoint.name());
            plan.insert(endpoint.id(), routes);
        }

        Ok(plan)
    }
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkView;
    use crate::range::StaticRangeModel;
    use ground_stations::{GroundStation, StationRegistry, MISSION_CONTROL_ID};
    use satellite_registry::{LiveProcessor, SatelliteRegistry, VesselCatalog};
    use std::rc::Rc;

    const RELAY_A: NodeId = NodeId::from_u128(0xA);
    const RELAY_B: NodeId = NodeId::from_u128(0xB);
    const SCOUT: NodeId = NodeId::from_u128(0xC);

    fn register(
        registry: &mut SatelliteRegistry<VesselCatalog>,
        id: NodeId,
        part_id: u32,
        antennas: Vec<Antenna>,
    ) {
        registry.register(Rc::new(LiveProcessor::new(
            part_id,
            id,
            format!("Sat {}", part_id),
            false,
            antennas,
        )));
    }

    /// Mission control at the origin, a relay chain stretching outward.
    fn chain() -> (SatelliteRegistry<VesselCatalog>, StationRegistry, StaticRangeModel) {
        let mut registry = SatelliteRegistry::new(VesselCatalog::new());
        register(&mut registry, RELAY_A, 1, vec![Antenna::omni(RELAY_A, 11, "Whip", 80_000_000.0)]);
        register(
            &mut registry,
            RELAY_B,
            2,
            vec![
                Antenna::omni(RELAY_B, 21, "Whip", 80_000_000.0),
                Antenna::dish(RELAY_B, 22, "Reflector", 1e10, Some(SCOUT)),
            ],
        );
        register(
            &mut registry,
            SCOUT,
            3,
            vec![Antenna::dish(SCOUT, 31, "Reflector", 1e10, Some(RELAY_B))],
        );

        let stations = StationRegistry::with_mission_control();

        let mut model = StaticRangeModel::new();
        model.place(MISSION_CONTROL_ID, [0.0, 0.0, 0.0]);
        model.place(RELAY_A, [50_000_000.0, 0.0, 0.0]);
        model.place(RELAY_B, [120_000_000.0, 0.0, 0.0]);
        model.place(SCOUT, [5_000_000_000.0, 0.0, 0.0]);

        (registry, stations, model)
    }

    #[test]
    fn test_multi_hop_route_to_mission_control() {
        let (registry, stations, model) = chain();
        let view = NetworkView::new(&registry, &stations);
        let planner = PathPlanner::new();

        let routes = planner.routes_to_command(SCOUT, &view, &model).unwrap();

        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        let hops: Vec<NodeId> = route.links().iter().map(|l| l.target().id).collect();
        assert_eq!(hops, vec![RELAY_B, RELAY_A, MISSION_CONTROL_ID]);
        assert_eq!(route.links()[0].port(), LinkPort::Dish);
        assert_eq!(route.links()[1].port(), LinkPort::Omni);

        let expected = 4_880_000_000.0 + 70_000_000.0 + 50_000_000.0;
        assert!((route.total_cost() - expected).abs() < 1.0);
        assert!((route.delay() - expected / SPEED_OF_LIGHT_M_S).abs() < 1e-9);
    }

    #[test]
    fn test_max_hops_limits_routes() {
        let (registry, stations, model) = chain();
        let view = NetworkView::new(&registry, &stations);
        let planner = PathPlanner::with_config(PlannerConfig {
            max_hops: 2,
            ..PlannerConfig::default()
        })
        .unwrap();

        let routes = planner.routes_to_command(SCOUT, &view, &model).unwrap();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_out_of_range_omni_has_no_link() {
        let planner = PathPlanner::new();
        let near = GroundStation::mission_control();
        let far = {
            let mut registry = SatelliteRegistry::new(VesselCatalog::new());
            register(&mut registry, RELAY_A, 1, vec![Antenna::omni(RELAY_A, 11, "Whip", 1_000.0)]);
            registry.get(RELAY_A).cloned().unwrap()
        };

        assert!(planner.link_between(&far, &near, 2_000.0).is_none());
        let link = planner.link_between(&far, &near, 900.0).unwrap();
        assert_eq!(link.port(), LinkPort::Omni);
        assert_eq!(link.transmitters()[0].part_id, 11);
        assert_eq!(link.receivers()[0].part_id, 0);
    }

    #[test]
    fn test_plan_all_covers_every_satellite() {
        let (registry, stations, model) = chain();
        let view = NetworkView::new(&registry, &stations);

        let plan = PathPlanner::new().plan_all(&view, &model).unwrap();

        assert_eq!(plan.len(), 3);
        assert!(!plan.contains_key(&MISSION_CONTROL_ID));
        assert_eq!(plan[&RELAY_A][0].hops(), 1);
        assert_eq!(plan[&RELAY_B][0].hops(), 2);
    }

    #[test]
    fn test_unknown_source() {
        let (registry, stations, model) = chain();
        let view = NetworkView::new(&registry, &stations);
        let err = PathPlanner::new()
            .routes_to_command(NodeId::from_u128(0xFF), &view, &model)
            .unwrap_err();
        assert_eq!(err, RoutingError::UnknownNode(NodeId::from_u128(0xFF)));
    }

    #[test]
    fn test_signal_speed_must_be_positive() {
        for speed in [0.0, -SPEED_OF_LIGHT_M_S, f64::NAN, f64::INFINITY] {
            let config = PlannerConfig {
                signal_speed_m_s: speed,
                ..PlannerConfig::default()
            };
            assert!(matches!(
                PathPlanner::with_config(config),
                Err(RoutingError::InvalidSignalSpeed(_))
            ));
        }

        let slow = PathPlanner::with_config(PlannerConfig {
            signal_speed_m_s: 1.0,
            ..PlannerConfig::default()
        })
        .unwrap();
        let (registry, stations, model) = chain();
        let view = NetworkView::new(&registry, &stations);
        let plan = slow.plan_all(&view, &model).unwrap();
        assert!(plan[&SCOUT][0].delay() > 1.0);
    }
}
