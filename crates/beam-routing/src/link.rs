//! A single hop of a route

use crate::{is_valid_scalar, Result, RoutingError};
use network_core::{AntennaRef, LinkPort, NodeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a link an antenna serves on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AntennaRole {
    Transmitter,
    Receiver,
}

impl fmt::Display for AntennaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AntennaRole::Transmitter => f.write_str("transmitter"),
            AntennaRole::Receiver => f.write_str("receiver"),
        }
    }
}

/// One hop to `target`. The source side is implicit: the route's source for
/// the first link, the previous link's target otherwise.
#[derive(Debug, Clone)]
pub struct Link {
    target: NodeRef,
    transmitters: Vec<AntennaRef>,
    receivers: Vec<AntennaRef>,
    port: LinkPort,
    cost: f64,
}

impl Link {
    pub fn new(
        target: NodeRef,
        transmitters: Vec<AntennaRef>,
        receivers: Vec<AntennaRef>,
        port: LinkPort,
        cost: f64,
    ) -> Result<Self> {
        if transmitters.is_empty() {
            return Err(RoutingError::EmptyAntennaSet {
                target: target.id,
                role: AntennaRole::Transmitter,
            });
        }
        if receivers.is_empty() {
            return Err(RoutingError::EmptyAntennaSet {
                target: target.id,
                role: AntennaRole::Receiver,
            });
        }
        if !is_valid_scalar(cost) {
            return Err(RoutingError::InvalidCost(cost));
        }

        Ok(Self {
            target,
            transmitters,
            receivers,
            port,
            cost,
        })
    }

    pub fn target(&self) -> &NodeRef {
        &self.target
    }

    pub fn transmitters(&self) -> &[AntennaRef] {
        &self.transmitters
    }

    pub fn receivers(&self) -> &[AntennaRef] {
        &self.receivers
    }

    pub fn port(&self) -> LinkPort {
        self.port
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Planner-side cost update; the only mutable field.
    pub fn set_cost(&mut self, cost: f64) -> Result<()> {
        if !is_valid_scalar(cost) {
            return Err(RoutingError::InvalidCost(cost));
        }
        self.cost = cost;
        Ok(())
    }
}

/// Links are the same hop when they reach the same node.
impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.target.id == other.target.id
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Link(T: {}, TX: [{}], RX: [{}], P: {}, C: {})",
            self.target,
            join(&self.transmitters),
            join(&self.receivers),
            self.port,
            self.cost
        )
    }
}

fn join(antennas: &[AntennaRef]) -> String {
    antennas
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
