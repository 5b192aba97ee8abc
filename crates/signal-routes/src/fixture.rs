//! Network fixtures loaded from JSON
//!
//! A fixture is a frozen description of the network (vessels, ground
//! stations and their positions) that stands in for the host simulation when
//! the route cache is inspected or rebuilt offline.

use crate::FixtureError;
use beam_routing::{NetworkView, Occluder, PathPlanner, PlannerConfig, StaticRangeModel};
use ground_stations::{GeoLocation, GroundStation, StationRegistry, StationStatus, MISSION_CONTROL_ID};
use network_core::{Antenna, NodeId};
use satellite_registry::{LiveProcessor, SatelliteRegistry, VesselCatalog, VesselSnapshot};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Kerbin-sized home body (m)
pub const DEFAULT_BODY_RADIUS_M: f64 = 600_000.0;

fn default_body_radius() -> f64 {
    DEFAULT_BODY_RADIUS_M
}

fn default_true() -> bool {
    true
}

fn default_status() -> StationStatus {
    StationStatus::Operational
}

#[derive(Debug, Deserialize)]
pub struct NetworkFixture {
    #[serde(default = "default_body_radius")]
    pub body_radius_m: f64,
    /// Adds the home body as an occluder at the origin
    #[serde(default = "default_true")]
    pub occlude_body: bool,
    #[serde(default)]
    pub occluders: Vec<Occluder>,
    #[serde(default = "default_true")]
    pub include_mission_control: bool,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub vessels: Vec<VesselFixture>,
    #[serde(default)]
    pub ground_stations: Vec<StationFixture>,
}

#[derive(Debug, Deserialize)]
pub struct VesselFixture {
    pub id: NodeId,
    pub name: String,
    /// Simulated this session; unloaded vessels become dormant satellites
    #[serde(default)]
    pub loaded: bool,
    #[serde(default = "default_true")]
    pub has_processor: bool,
    #[serde(default)]
    pub command_station: bool,
    /// Part carrying the signal processor when loaded
    #[serde(default)]
    pub processor_part_id: Option<u32>,
    /// Body-centred position (m)
    pub position: [f64; 3],
    #[serde(default)]
    pub antennas: Vec<AntennaFixture>,
}

#[derive(Debug, Deserialize)]
pub struct StationFixture {
    pub id: NodeId,
    pub name: String,
    pub location: GeoLocation,
    #[serde(default = "default_status")]
    pub status: StationStatus,
    #[serde(default)]
    pub antennas: Vec<AntennaFixture>,
}

/// Antenna without its owner, which comes from the enclosing entry
#[derive(Debug, Deserialize)]
pub struct AntennaFixture {
    pub part_id: u32,
    pub name: String,
    #[serde(default = "default_true")]
    pub activated: bool,
    #[serde(default = "default_true")]
    pub powered: bool,
    #[serde(default)]
    pub omni_range_m: f64,
    #[serde(default)]
    pub dish_range_m: f64,
    #[serde(default)]
    pub dish_target: Option<NodeId>,
}

impl AntennaFixture {
    fn fit_to(&self, owner: NodeId) -> Antenna {
        Antenna {
            owner,
            part_id: self.part_id,
            name: self.name.clone(),
            activated: self.activated,
            powered: self.powered,
            omni_range_m: self.omni_range_m,
            dish_range_m: self.dish_range_m,
            dish_target: self.dish_target,
        }
    }
}

/// Everything an offline route cache session needs
pub struct Session {
    pub registry: SatelliteRegistry<VesselCatalog>,
    pub stations: StationRegistry,
    pub model: StaticRangeModel,
    pub planner: PathPlanner,
}

impl Session {
    pub fn view(&self) -> NetworkView<'_, VesselCatalog> {
        NetworkView::new(&self.registry, &self.stations)
    }
}

impl NetworkFixture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        info!("Loading network fixture from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(text: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the registries and range model the fixture describes.
    pub fn into_session(self) -> Result<Session, FixtureError> {
        let planner = PathPlanner::with_config(self.planner)?;

        let mut model = StaticRangeModel::new();
        if self.occlude_body {
            model.add_occluder(Occluder {
                center: [0.0; 3],
                radius_m: self.body_radius_m,
            });
        }
        for occluder in &self.occluders {
            model.add_occluder(*occluder);
        }

        let mut catalog = VesselCatalog::new();
        for vessel in &self.vessels {
            let mut snapshot = VesselSnapshot::new(vessel.id, vessel.name.clone());
            snapshot.has_processor = vessel.has_processor;
            snapshot.command_station = vessel.command_station;
            snapshot.antennas = vessel.antennas.iter().map(|a| a.fit_to(vessel.id)).collect();
            catalog.insert(snapshot);
            model.place(vessel.id, vessel.position);
        }

        let mut registry = SatelliteRegistry::new(catalog);
        for (index, vessel) in self.vessels.iter().enumerate() {
            if vessel.loaded && vessel.has_processor {
                let part_id = vessel.processor_part_id.unwrap_or(index as u32 + 1);
                let antennas = vessel.antennas.iter().map(|a| a.fit_to(vessel.id)).collect();
                registry.register(
                    LiveProcessor::new(part_id, vessel.id, vessel.name.clone(), vessel.command_station, antennas)
                        .into_handle(),
                );
            } else {
                registry.register_proto(vessel.id);
            }
        }

        let mut stations = if self.include_mission_control {
            StationRegistry::with_mission_control()
        } else {
            StationRegistry::new()
        };
        for fixture in &self.ground_stations {
            let mut station = GroundStation::new(fixture.id, fixture.name.clone(), fixture.location);
            station.status = fixture.status;
            station.antennas = fixture.antennas.iter().map(|a| a.fit_to(fixture.id)).collect();
            stations.add(station)?;
        }
        for station in stations.iter() {
            model.place(station.id, station.location.to_cartesian(self.body_radius_m));
        }

        debug!(
            "Fixture session: {} satellite(s), {} station(s), mission control {}",
            registry.len(),
            stations.len(),
            if stations.find(MISSION_CONTROL_ID).is_some() { "present" } else { "absent" }
        );

        Ok(Session {
            registry,
            stations,
            model,
            planner,
        })
    }
}
