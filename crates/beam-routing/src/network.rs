//! Directory view over the satellite and ground station registries

use ground_stations::StationRegistry;
use network_core::{Endpoint, NetworkDirectory, NodeId};
use satellite_registry::{SatelliteRegistry, VesselSource};

pub struct NetworkView<'a, S: VesselSource> {
    satellites: &'a SatelliteRegistry<S>,
    stations: &'a StationRegistry,
}

impl<'a, S: VesselSource> NetworkView<'a, S> {
    pub fn new(satellites: &'a SatelliteRegistry<S>, stations: &'a StationRegistry) -> Self {
        Self {
            satellites,
            stations,
        }
    }

    pub fn satellites(&self) -> &'a SatelliteRegistry<S> {
        self.satellites
    }

    pub fn stations(&self) -> &'a StationRegistry {
        self.stations
    }
}

impl<'a, S: VesselSource> NetworkDirectory for NetworkView<'a, S> {
    fn satellite(&self, id: NodeId) -> Option<&dyn Endpoint> {
        self.satellites.get(id).map(|s| s as &dyn Endpoint)
    }

    fn ground_station(&self, id: NodeId) -> Option<&dyn Endpoint> {
        self.stations.find(id).map(|s| s as &dyn Endpoint)
    }

    /// Sorted by id within each group so planning is deterministic.
    fn endpoints(&self) -> Vec<&dyn Endpoint> {
        let mut satellites: Vec<&dyn Endpoint> =
            self.satellites.iter().map(|s| s as &dyn Endpoint).collect();
        satellites.sort_by_key(|e| e.id());

        let mut stations: Vec<&dyn Endpoint> =
            self.stations.iter().map(|s| s as &dyn Endpoint).collect();
        stations.sort_by_key(|e| e.id());

        satellites.extend(stations);
        satellites
    }
}
