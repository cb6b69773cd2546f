//! The routing seam between node-level orchestration and the database.
//!
//! [`RoutingEngine`] exposes the five primitives the database provides:
//! nearest-vertex lookup, geodesic distance, and the three pgRouting
//! searches. [`crate::pg::PgRouting`] implements it over a live connection;
//! the node-to-node functions in [`crate::routing`] are written against the
//! trait so they never depend on a particular driver.

use tracing::warn;

use crate::error::{Error, Result};
use crate::node::{PgrNode, Routing, VertexCosts, VertexId, VertexRoutings};

/// Database primitives used for routing.
pub trait RoutingEngine {
    /// Closest graph vertex to a coordinate, if the graph has any vertex.
    fn nearest_vertex(&mut self, node: &PgrNode) -> Result<Option<PgrNode>>;

    /// Geodesic distance between two coordinates in metres.
    fn node_distance(&mut self, from: &PgrNode, to: &PgrNode) -> Result<f64>;

    /// All-pairs aggregate costs without paths (`pgr_dijkstraCost`).
    fn dijkstra_cost(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexCosts>;

    /// All-pairs shortest paths with costs (`pgr_dijkstra`).
    fn dijkstra(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexRoutings>;

    /// One-to-one shortest path (`pgr_aStar`).
    fn astar(&mut self, start_vid: VertexId, end_vid: VertexId) -> Result<VertexRoutings>;

    /// Snap every node to its nearest vertex, preserving input order.
    ///
    /// Fails on the first node for which the graph has no vertex.
    fn find_nearest_vertices(&mut self, nodes: &[PgrNode]) -> Result<Vec<PgrNode>> {
        let mut vertices = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.nearest_vertex(node)? {
                Some(vertex) => vertices.push(vertex),
                None => {
                    warn!(lon = node.lon, lat = node.lat, "cannot find nearest vertex");
                    return Err(Error::VertexNotFound {
                        lon: node.lon,
                        lat: node.lat,
                    });
                }
            }
        }
        Ok(vertices)
    }
}

impl<E: RoutingEngine + ?Sized> RoutingEngine for &mut E {
    fn nearest_vertex(&mut self, node: &PgrNode) -> Result<Option<PgrNode>> {
        (**self).nearest_vertex(node)
    }

    fn node_distance(&mut self, from: &PgrNode, to: &PgrNode) -> Result<f64> {
        (**self).node_distance(from, to)
    }

    fn dijkstra_cost(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexCosts> {
        (**self).dijkstra_cost(start_vids, end_vids)
    }

    fn dijkstra(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexRoutings> {
        (**self).dijkstra(start_vids, end_vids)
    }

    fn astar(&mut self, start_vid: VertexId, end_vid: VertexId) -> Result<VertexRoutings> {
        (**self).astar(start_vid, end_vid)
    }
}

/// One row of a pgRouting path result joined with vertex coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathRow {
    pub start_vid: VertexId,
    pub end_vid: VertexId,
    pub node: VertexId,
    /// Edge leaving `node`; negative on the terminal row of a path.
    pub edge: i64,
    pub agg_cost: f64,
    pub lon: f64,
    pub lat: f64,
}

/// Group path rows by (start_vid, end_vid), in row order.
///
/// Each row contributes its node to the path. The terminal row (`edge < 0`)
/// carries the aggregate cost of the whole path; groups that never see one
/// keep [`Routing::UNKNOWN_COST`].
pub fn collect_paths<I>(rows: I) -> VertexRoutings
where
    I: IntoIterator<Item = PathRow>,
{
    let mut output = VertexRoutings::new();
    for row in rows {
        let routing = output
            .entry((row.start_vid, row.end_vid))
            .or_insert_with(|| Routing::new(Vec::new(), Routing::UNKNOWN_COST));
        routing.path.push(PgrNode::vertex(row.node, row.lon, row.lat));
        if row.edge < 0 {
            routing.cost = row.agg_cost;
        }
    }
    output
}
