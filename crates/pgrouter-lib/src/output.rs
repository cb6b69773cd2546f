use std::fmt::{self, Write};

use serde::Serialize;

use crate::error::Result;
use crate::node::{
    key_by_endpoints, PairCosts, PairRoutings, PgrNode, Routing, VertexCosts, VertexRoutings,
};

/// Structured representation of one routing that consumers can serialise.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoutingSummary {
    pub from: PgrNode,
    pub to: PgrNode,
    pub cost: f64,
    pub points: usize,
    pub path: Vec<PgrNode>,
}

impl RoutingSummary {
    fn new(from: PgrNode, to: PgrNode, routing: &Routing) -> Self {
        Self {
            from,
            to,
            cost: routing.cost,
            points: routing.path.len(),
            path: routing.path.clone(),
        }
    }

    /// Summaries of node-to-node routings, in map order.
    pub fn from_pairs(routings: &PairRoutings) -> Vec<Self> {
        routings
            .iter()
            .map(|((from, to), routing)| Self::new(*from, *to, routing))
            .collect()
    }

    /// Summaries of vertex-to-vertex routings; the endpoints are the first
    /// and last path vertices.
    pub fn from_vertex_pairs(routings: &VertexRoutings) -> Result<Vec<Self>> {
        Ok(Self::from_pairs(&key_by_endpoints(routings)?))
    }

    /// Human-readable rendering, one path point per line.
    pub fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Routing: {} -> {} (cost {}, {} points)",
            self.from, self.to, self.cost, self.points
        );
        for (index, node) in self.path.iter().enumerate() {
            let _ = writeln!(buffer, "{index:>4}: {node}");
        }
        buffer
    }
}

/// Aggregate cost between two endpoints (nodes or vertex ids).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CostSummary<T> {
    pub from: T,
    pub to: T,
    pub cost: f64,
}

impl CostSummary<PgrNode> {
    pub fn from_pairs(costs: &PairCosts) -> Vec<Self> {
        costs
            .iter()
            .map(|((from, to), cost)| Self {
                from: *from,
                to: *to,
                cost: *cost,
            })
            .collect()
    }
}

impl CostSummary<i64> {
    pub fn from_vertex_pairs(costs: &VertexCosts) -> Vec<Self> {
        costs
            .iter()
            .map(|((from, to), cost)| Self {
                from: *from,
                to: *to,
                cost: *cost,
            })
            .collect()
    }
}

impl<T: fmt::Display> fmt::Display for CostSummary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.cost)
    }
}

/// A coordinate and the vertex it snaps to.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VertexSummary {
    pub node: PgrNode,
    pub vertex: PgrNode,
}

impl fmt::Display for VertexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.node, self.vertex)
    }
}
