//! Coordinates, graph vertices and the routing result shapes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a vertex in the `<table>_vertices_pgr` table.
pub type VertexId = i64;

/// Ordered (start, end) pair of vertex identifiers.
pub type VertexPair = (VertexId, VertexId);

/// Ordered (start, end) pair of nodes.
pub type NodePair = (PgrNode, PgrNode);

/// Vertex-to-vertex paths keyed by (start_vid, end_vid).
pub type VertexRoutings = IndexMap<VertexPair, Routing>;

/// Vertex-to-vertex aggregate costs keyed by (start_vid, end_vid).
pub type VertexCosts = IndexMap<VertexPair, f64>;

/// Node-to-node paths keyed by (start node, end node).
pub type PairRoutings = IndexMap<NodePair, Routing>;

/// Node-to-node costs keyed by (start node, end node).
pub type PairCosts = IndexMap<NodePair, f64>;

/// A geographic point, optionally bound to a graph vertex.
///
/// Free coordinates supplied by callers carry `id: None`; nodes read back
/// from the vertices table carry the vertex identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PgrNode {
    pub id: Option<VertexId>,
    pub lon: f64,
    pub lat: f64,
}

impl PgrNode {
    /// A free coordinate not (yet) bound to a vertex.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { id: None, lon, lat }
    }

    /// A graph vertex at the given position.
    pub fn vertex(id: VertexId, lon: f64, lat: f64) -> Self {
        Self {
            id: Some(id),
            lon,
            lat,
        }
    }

    fn key_bits(&self) -> (Option<VertexId>, u64, u64) {
        (self.id, canonical_bits(self.lon), canonical_bits(self.lat))
    }
}

// -0.0 and 0.0 denote the same coordinate.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for PgrNode {
    fn eq(&self, other: &Self) -> bool {
        self.key_bits() == other.key_bits()
    }
}

impl Eq for PgrNode {}

impl Hash for PgrNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_bits().hash(state);
    }
}

impl fmt::Display for PgrNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{},{} (vertex {})", self.lon, self.lat, id),
            None => write!(f, "{},{}", self.lon, self.lat),
        }
    }
}

/// Error returned when a `lon,lat` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNodeError(String);

impl fmt::Display for ParseNodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected `lon,lat`, got {:?}", self.0)
    }
}

impl std::error::Error for ParseNodeError {}

impl FromStr for PgrNode {
    type Err = ParseNodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || ParseNodeError(s.to_string());
        let (lon, lat) = s.split_once(',').ok_or_else(err)?;
        let lon: f64 = lon.trim().parse().map_err(|_| err())?;
        let lat: f64 = lat.trim().parse().map_err(|_| err())?;
        if !lon.is_finite() || !lat.is_finite() {
            return Err(err());
        }
        Ok(PgrNode::new(lon, lat))
    }
}

/// A path through the graph together with its aggregate cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Routing {
    pub path: Vec<PgrNode>,
    pub cost: f64,
}

impl Routing {
    /// Cost reported for a vertex pair whose terminal row never arrived.
    pub const UNKNOWN_COST: f64 = -1.0;

    pub fn new(path: Vec<PgrNode>, cost: f64) -> Self {
        Self { path, cost }
    }
}

/// Re-key vertex-to-vertex routings by the vertices at either end of each
/// path, so they can be rendered like node-to-node routings.
pub fn key_by_endpoints(routings: &VertexRoutings) -> Result<PairRoutings> {
    routings
        .values()
        .map(|routing| match (routing.path.first(), routing.path.last()) {
            (Some(from), Some(to)) => Ok(((*from, *to), routing.clone())),
            _ => Err(Error::EmptyRouting),
        })
        .collect()
}
