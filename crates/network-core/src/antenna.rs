//! Antenna capabilities
//!
//! The range and targeting rules themselves belong to the range model; this
//! module only answers "is this antenna up", "how far does it reach" and
//! "is it pointed at that node".

use crate::{CoreError, NodeId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Antenna port kind used by a link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LinkPort {
    /// Non-directional, reaches every node in range
    Omni,
    /// Directional, reaches only its target
    Dish,
}

impl LinkPort {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPort::Omni => "Omni",
            LinkPort::Dish => "Dish",
        }
    }
}

impl fmt::Display for LinkPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkPort {
    type Err = String;

    /// Only the two exact literals are accepted.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Omni" => Ok(LinkPort::Omni),
            "Dish" => Ok(LinkPort::Dish),
            other => Err(other.to_string()),
        }
    }
}

/// One piece of radio hardware fitted to a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Antenna {
    /// Node the part is attached to
    pub owner: NodeId,
    /// Part-level identity, stable across reloads
    pub part_id: u32,
    pub name: String,
    pub activated: bool,
    pub powered: bool,
    /// Omnidirectional range in metres (0 = no omni capability)
    #[serde(default)]
    pub omni_range_m: f64,
    /// Dish range in metres (0 = no dish capability)
    #[serde(default)]
    pub dish_range_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dish_target: Option<NodeId>,
}

impl Antenna {
    pub fn omni(owner: NodeId, part_id: u32, name: impl Into<String>, range_m: f64) -> Self {
        Self {
            owner,
            part_id,
            name: name.into(),
            activated: true,
            powered: true,
            omni_range_m: range_m,
            dish_range_m: 0.0,
            dish_target: None,
        }
    }

    pub fn dish(
        owner: NodeId,
        part_id: u32,
        name: impl Into<String>,
        range_m: f64,
        target: Option<NodeId>,
    ) -> Self {
        Self {
            owner,
            part_id,
            name: name.into(),
            activated: true,
            powered: true,
            omni_range_m: 0.0,
            dish_range_m: range_m,
            dish_target: target,
        }
    }

    pub fn is_active(&self) -> bool {
        self.activated && self.powered
    }

    /// Effective range for the given port, 0 when the antenna is down.
    pub fn effective_range(&self, port: LinkPort) -> f64 {
        if !self.is_active() {
            return 0.0;
        }
        match port {
            LinkPort::Omni => self.omni_range_m.max(0.0),
            LinkPort::Dish => self.dish_range_m.max(0.0),
        }
    }

    /// Whether the dish is up and pointed at `node`.
    pub fn can_target(&self, node: NodeId) -> bool {
        self.effective_range(LinkPort::Dish) > 0.0 && self.dish_target == Some(node)
    }

    pub fn to_ref(&self) -> AntennaRef {
        AntennaRef {
            owner: self.owner,
            part_id: self.part_id,
            name: self.name.clone(),
        }
    }
}

/// Persistable reference to a specific antenna on a specific node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AntennaRef {
    pub owner: NodeId,
    pub part_id: u32,
    pub name: String,
}

impl fmt::Display for AntennaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.part_id)
    }
}

/// Parse a persisted part id.
pub fn parse_part_id(raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| CoreError::InvalidPartId(raw.to_string()))
}
