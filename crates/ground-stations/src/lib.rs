//! Ground Stations Library
//!
//! Fixed network endpoints: mission control and any additional
//! ground stations, with operational status tracking.

use network_core::{Antenna, Endpoint, EndpointKind, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Default mission control identity
pub const MISSION_CONTROL_ID: NodeId = NodeId::from_u128(0x5105f5a9_d628_41c6_ad4b_21154e8fc488);

/// Mission control omni range (75 Mm)
pub const MISSION_CONTROL_RANGE_M: f64 = 75_000_000.0;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("Station not found: {0}")]
    NotFound(NodeId),
    #[error("Station offline: {0}")]
    Offline(NodeId),
    #[error("Station already registered: {0}")]
    Duplicate(NodeId),
}

pub type Result<T> = std::result::Result<T, StationError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundStation {
    pub id: NodeId,
    pub name: String,
    pub location: GeoLocation,
    pub status: StationStatus,
    pub antennas: Vec<Antenna>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

impl GeoLocation {
    /// Body-fixed cartesian position (metres) on a sphere of `body_radius_m`.
    pub fn to_cartesian(&self, body_radius_m: f64) -> [f64; 3] {
        let r = body_radius_m + self.altitude_m;
        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        [
            r * lat.cos() * lon.cos(),
            r * lat.cos() * lon.sin(),
            r * lat.sin(),
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum StationStatus {
    Operational,
    Degraded,
    Maintenance,
    Offline,
}

impl GroundStation {
    pub fn new(id: NodeId, name: impl Into<String>, location: GeoLocation) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            status: StationStatus::Operational,
            antennas: Vec::new(),
        }
    }

    pub fn with_antenna(mut self, antenna: Antenna) -> Self {
        self.antennas.push(antenna);
        self
    }

    /// The default mission control station with its single omni antenna.
    pub fn mission_control() -> Self {
        Self::new(
            MISSION_CONTROL_ID,
            "Mission Control",
            GeoLocation {
                latitude: -0.1313315,
                longitude: -74.59484,
                altitude_m: 75.0,
            },
        )
        .with_antenna(Antenna::omni(
            MISSION_CONTROL_ID,
            0,
            "Mission Control Array",
            MISSION_CONTROL_RANGE_M,
        ))
    }

    pub fn is_operational(&self) -> bool {
        matches!(
            self.status,
            StationStatus::Operational | StationStatus::Degraded
        )
    }
}

impl Endpoint for GroundStation {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EndpointKind {
        EndpointKind::GroundStation
    }

    fn antennas(&self) -> Box<dyn Iterator<Item = &Antenna> + '_> {
        Box::new(self.antennas.iter())
    }

    fn is_command_station(&self) -> bool {
        self.is_operational()
    }
}

pub struct StationRegistry {
    stations: HashMap<NodeId, GroundStation>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self {
            stations: HashMap::new(),
        }
    }

    pub fn with_mission_control() -> Self {
        let mut registry = Self::new();
        registry.stations.insert(MISSION_CONTROL_ID, GroundStation::mission_control());
        registry
    }

    pub fn add(&mut self, station: GroundStation) -> Result<()> {
        if self.stations.contains_key(&station.id) {
            return Err(StationError::Duplicate(station.id));
        }
        debug!("Adding ground station {} ({})", station.name, station.id);
        self.stations.insert(station.id, station);
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Result<&GroundStation> {
        self.stations.get(&id).ok_or(StationError::NotFound(id))
    }

    pub fn find(&self, id: NodeId) -> Option<&GroundStation> {
        self.stations.get(&id)
    }

    /// Look up a station that can currently take part in routing.
    pub fn get_operational(&self, id: NodeId) -> Result<&GroundStation> {
        let station = self.get(id)?;
        if !station.is_operational() {
            return Err(StationError::Offline(id));
        }
        Ok(station)
    }

    pub fn operational(&self) -> impl Iterator<Item = &GroundStation> {
        self.stations.values().filter(|s| s.is_operational())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroundStation> {
        self.stations.values()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn set_status(&mut self, id: NodeId, status: StationStatus) -> Result<()> {
        let station = self
            .stations
            .get_mut(&id)
            .ok_or(StationError::NotFound(id))?;
        debug!("Station {} status {:?} -> {:?}", station.name, station.status, status);
        station.status = status;
        Ok(())
    }
}

impl Default for StationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mission_control_seeded() {
        let registry = StationRegistry::with_mission_control();
        let station = registry.get(MISSION_CONTROL_ID).unwrap();

        assert_eq!(station.name, "Mission Control");
        assert!(station.is_command_station());
        assert_eq!(
            MISSION_CONTROL_ID.to_string(),
            "5105f5a9-d628-41c6-ad4b-21154e8fc488"
        );
        assert!(station.antenna(0).is_some());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = StationRegistry::with_mission_control();
        let err = registry.add(GroundStation::mission_control()).unwrap_err();
        assert!(matches!(err, StationError::Duplicate(id) if id == MISSION_CONTROL_ID));
    }

    #[test]
    fn test_offline_station_is_not_command_station() {
        let mut registry = StationRegistry::with_mission_control();
        registry
            .set_status(MISSION_CONTROL_ID, StationStatus::Offline)
            .unwrap();

        assert_eq!(registry.operational().count(), 0);
        assert!(matches!(
            registry.get_operational(MISSION_CONTROL_ID),
            Err(StationError::Offline(_))
        ));
        assert!(!registry.get(MISSION_CONTROL_ID).unwrap().is_command_station());
    }

    #[test]
    fn test_missing_station() {
        let registry = StationRegistry::new();
        assert!(matches!(
            registry.get(NodeId::from_u128(9)),
            Err(StationError::NotFound(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_to_cartesian_on_equator() {
        let location = GeoLocation {
            latitude: 0.0,
            longitude: 90.0,
            altitude_m: 0.0,
        };
        let [x, y, z] = location.to_cartesian(600_000.0);
        assert!(x.abs() < 1e-6);
        assert!((y - 600_000.0).abs() < 1e-6);
        assert!(z.abs() < 1e-6);
    }
}
