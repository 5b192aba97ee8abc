//! Range and line-of-sight queries
//!
//! The physical model lives with the host. `StaticRangeModel` is a fixed
//! snapshot of positions with optional spherical occluders (planets, moons),
//! enough for tooling and tests.

use network_core::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub trait RangeModel {
    /// Straight-line distance in metres, `None` without line of sight.
    fn distance(&self, from: NodeId, to: NodeId) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Occluder {
    pub center: [f64; 3],
    pub radius_m: f64,
}

impl Occluder {
    /// Whether the segment a-b passes through the sphere.
    fn blocks(&self, a: [f64; 3], b: [f64; 3]) -> bool {
        let ab = sub(b, a);
        let ac = sub(self.center, a);
        let len_sq = dot(ab, ab);
        let t = if len_sq > 0.0 {
            (dot(ac, ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = [a[0] + ab[0] * t, a[1] + ab[1] * t, a[2] + ab[2] * t];
        // 1 m tolerance so surface stations are not self-occluded
        norm(sub(self.center, closest)) < self.radius_m - 1.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticRangeModel {
    positions: HashMap<NodeId, [f64; 3]>,
    occluders: Vec<Occluder>,
}

impl StaticRangeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, node: NodeId, position: [f64; 3]) {
        self.positions.insert(node, position);
    }

    pub fn add_occluder(&mut self, occluder: Occluder) {
        self.occluders.push(occluder);
    }

    pub fn position(&self, node: NodeId) -> Option<[f64; 3]> {
        self.positions.get(&node).copied()
    }
}

impl RangeModel for StaticRangeModel {
    fn distance(&self, from: NodeId, to: NodeId) -> Option<f64> {
        let a = self.position(from)?;
        let b = self.position(to)?;
        if self.occluders.iter().any(|o| o.blocks(a, b)) {
            return None;
        }
        Some(norm(sub(b, a)))
    }
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}
