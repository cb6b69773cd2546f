// Test-only helpers for `pgrouter-lib` tests
#![allow(dead_code)]

use std::collections::HashMap;

use crate::engine::RoutingEngine;
use crate::error::Result;
use crate::node::{PgrNode, Routing, VertexCosts, VertexId, VertexPair, VertexRoutings};

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// In-memory engine answering from canned vertex-to-vertex paths.
///
/// Distances are planar in degrees scaled to metres (0.001° = 1 m) so tests
/// can reason about access costs with round numbers.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub vertices: Vec<PgrNode>,
    pub paths: HashMap<VertexPair, (Vec<VertexId>, f64)>,
    pub nearest_calls: usize,
    pub astar_calls: Vec<VertexPair>,
    pub dijkstra_calls: Vec<(Vec<VertexId>, Vec<VertexId>)>,
    pub dijkstra_cost_calls: Vec<(Vec<VertexId>, Vec<VertexId>)>,
}

impl FakeEngine {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Unit square 1:(0,0) 2:(1,0) 3:(1,1) 4:(0,1); each side costs 10.
    pub fn square() -> Self {
        let mut engine = Self {
            vertices: vec![
                PgrNode::vertex(1, 0.0, 0.0),
                PgrNode::vertex(2, 1.0, 0.0),
                PgrNode::vertex(3, 1.0, 1.0),
                PgrNode::vertex(4, 0.0, 1.0),
            ],
            ..Self::default()
        };
        for (from, to) in [(1, 2), (2, 3), (3, 4), (4, 1)] {
            engine.add_path(&[from, to], 10.0);
            engine.add_path(&[to, from], 10.0);
        }
        for via in [[1, 2, 3], [3, 2, 1], [2, 1, 4], [4, 1, 2]] {
            engine.add_path(&via, 20.0);
        }
        engine
    }

    pub fn add_path(&mut self, via: &[VertexId], cost: f64) {
        let key = (via[0], via[via.len() - 1]);
        self.paths.insert(key, (via.to_vec(), cost));
    }

    fn vertex(&self, id: VertexId) -> PgrNode {
        self.vertices
            .iter()
            .copied()
            .find(|vertex| vertex.id == Some(id))
            .expect("canned path references a known vertex")
    }

    fn routing(&self, key: VertexPair) -> Option<Routing> {
        self.paths.get(&key).map(|(via, cost)| {
            Routing::new(via.iter().map(|id| self.vertex(*id)).collect(), *cost)
        })
    }

    fn planar(a: &PgrNode, b: &PgrNode) -> f64 {
        ((a.lon - b.lon).powi(2) + (a.lat - b.lat).powi(2)).sqrt()
    }
}

impl RoutingEngine for FakeEngine {
    fn nearest_vertex(&mut self, node: &PgrNode) -> Result<Option<PgrNode>> {
        self.nearest_calls += 1;
        Ok(self.vertices.iter().copied().min_by(|a, b| {
            Self::planar(a, node).total_cmp(&Self::planar(b, node))
        }))
    }

    fn node_distance(&mut self, from: &PgrNode, to: &PgrNode) -> Result<f64> {
        Ok(Self::planar(from, to) * 1000.0)
    }

    fn dijkstra_cost(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexCosts> {
        self.dijkstra_cost_calls
            .push((start_vids.to_vec(), end_vids.to_vec()));
        let mut costs = VertexCosts::new();
        for &start in start_vids {
            for &end in end_vids {
                if let Some(routing) = self.routing((start, end)) {
                    costs.insert((start, end), routing.cost);
                }
            }
        }
        Ok(costs)
    }

    fn dijkstra(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexRoutings> {
        self.dijkstra_calls
            .push((start_vids.to_vec(), end_vids.to_vec()));
        let mut routings = VertexRoutings::new();
        for &start in start_vids {
            for &end in end_vids {
                if let Some(routing) = self.routing((start, end)) {
                    routings.insert((start, end), routing);
                }
            }
        }
        Ok(routings)
    }

    fn astar(&mut self, start_vid: VertexId, end_vid: VertexId) -> Result<VertexRoutings> {
        self.astar_calls.push((start_vid, end_vid));
        Ok(self
            .routing((start_vid, end_vid))
            .map(|routing| ((start_vid, end_vid), routing))
            .into_iter()
            .collect())
    }
}
