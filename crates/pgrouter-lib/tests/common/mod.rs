//! Common test utilities shared by the integration tests.
//!
//! [`ScriptedEngine`] answers every pgRouting primitive from fixed rows, the
//! way the database would hand them back, so the node-level routing can be
//! exercised without a live server.

use pgrouter_lib::{
    collect_paths, PathRow, PgrNode, Result, RoutingEngine, VertexCosts, VertexId, VertexRoutings,
};

/// Vertices of a three-vertex line graph: 10 — 20 — 30, 0.01° apart.
pub fn line_vertices() -> Vec<PgrNode> {
    vec![
        PgrNode::vertex(10, 116.30, 40.00),
        PgrNode::vertex(20, 116.31, 40.00),
        PgrNode::vertex(30, 116.32, 40.00),
    ]
}

#[derive(Debug)]
pub struct ScriptedEngine {
    pub vertices: Vec<PgrNode>,
    pub rows: Vec<PathRow>,
    /// Metres reported for every access leg.
    pub access_distance: f64,
}

impl ScriptedEngine {
    /// Line graph with edge costs of 60 seconds, routable in both directions.
    pub fn line() -> Self {
        let vertices = line_vertices();
        let mut rows = Vec::new();
        let walks: [&[usize]; 6] = [&[0, 1], &[0, 1, 2], &[1, 0], &[1, 2], &[2, 1, 0], &[2, 1]];
        for walk in walks {
            let start = vertices[walk[0]].id.unwrap_or_default();
            let end = vertices[walk[walk.len() - 1]].id.unwrap_or_default();
            for (step, index) in walk.iter().enumerate() {
                let vertex = vertices[*index];
                let terminal = step == walk.len() - 1;
                rows.push(PathRow {
                    start_vid: start,
                    end_vid: end,
                    node: vertex.id.unwrap_or_default(),
                    edge: if terminal { -1 } else { 100 + step as i64 },
                    agg_cost: 60.0 * step as f64,
                    lon: vertex.lon,
                    lat: vertex.lat,
                });
            }
        }
        Self {
            vertices,
            rows,
            access_distance: 25.0,
        }
    }

    fn select(&self, starts: &[VertexId], ends: &[VertexId]) -> VertexRoutings {
        collect_paths(
            self.rows
                .iter()
                .copied()
                .filter(|row| starts.contains(&row.start_vid) && ends.contains(&row.end_vid)),
        )
    }
}

impl RoutingEngine for ScriptedEngine {
    fn nearest_vertex(&mut self, node: &PgrNode) -> Result<Option<PgrNode>> {
        Ok(self.vertices.iter().copied().min_by(|a, b| {
            (a.lon - node.lon)
                .abs()
                .total_cmp(&(b.lon - node.lon).abs())
        }))
    }

    fn node_distance(&mut self, _from: &PgrNode, _to: &PgrNode) -> Result<f64> {
        Ok(self.access_distance)
    }

    fn dijkstra_cost(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexCosts> {
        Ok(self
            .select(start_vids, end_vids)
            .into_iter()
            .map(|(key, routing)| (key, routing.cost))
            .collect())
    }

    fn dijkstra(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexRoutings> {
        Ok(self.select(start_vids, end_vids))
    }

    fn astar(&mut self, start_vid: VertexId, end_vid: VertexId) -> Result<VertexRoutings> {
        Ok(self.select(&[start_vid], &[end_vid]))
    }
}
