//! Multi-hop routes

use crate::link::Link;
use crate::{is_valid_scalar, Result, RoutingError};
use network_core::{NodeId, NodeRef};
use std::fmt;

/// A chain of links from `source` to the final link's target.
///
/// Delay models propagation time and is independent of the per-link costs.
/// Chaining (link *i*'s target is link *i+1*'s source) is the producer's
/// responsibility.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    source: NodeRef,
    /// `None` once the planner tombstones the route
    links: Option<Vec<Link>>,
    delay: f64,
}

impl Route {
    pub fn new(source: NodeRef, links: Vec<Link>, delay: f64) -> Result<Self> {
        if links.is_empty() {
            return Err(RoutingError::EmptyRoute);
        }
        if !is_valid_scalar(delay) {
            return Err(RoutingError::InvalidDelay(delay));
        }
        Ok(Self {
            source,
            links: Some(links),
            delay,
        })
    }

    pub fn source(&self) -> &NodeRef {
        &self.source
    }

    /// Final link target; `None` for a tombstoned route.
    pub fn goal(&self) -> Option<&NodeRef> {
        self.links().last().map(Link::target)
    }

    pub fn links(&self) -> &[Link] {
        self.links.as_deref().unwrap_or_default()
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn hops(&self) -> usize {
        self.links().len()
    }

    pub fn total_cost(&self) -> f64 {
        self.links().iter().map(Link::cost).sum()
    }

    /// Whether the route passes through or ends at `node`.
    pub fn contains(&self, node: NodeId) -> bool {
        self.source.id == node || self.links().iter().any(|l| l.target().id == node)
    }

    /// Clear the link list. Tombstoned routes stay in memory but are never
    /// written out.
    pub fn tombstone(&mut self) {
        self.links = None;
    }

    pub fn is_tombstoned(&self) -> bool {
        self.links.is_none()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tombstoned() {
            return write!(f, "Route({}, tombstoned)", self.source.name);
        }
        write!(f, "Route({}", self.source.name)?;
        for link in self.links() {
            write!(f, " -[{}]-> {}", link.port(), link.target().name)?;
        }
        write!(f, ", delay: {}, cost: {})", self.delay, self.total_cost())
    }
}
