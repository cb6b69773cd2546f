//! pgRouting client library entry points.
//!
//! This crate formats parameterized calls to the pgRouting shortest-path
//! functions, snaps arbitrary coordinates to the nearest graph vertex,
//! stitches the access legs onto vertex-to-vertex paths and serializes the
//! result as GPX track logs. All graph search happens inside the database;
//! higher-level consumers (the CLI) should only depend on the functions
//! exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod config;
pub mod engine;
pub mod error;
pub mod gpx;
pub mod node;
pub mod output;
pub mod pg;
pub mod routing;
pub mod sql;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{ConnectionConfig, EdgeTable, EdgeTableKey, EdgeTableValue};
pub use engine::{collect_paths, PathRow, RoutingEngine};
pub use error::{Error, Result};
pub use gpx::{render_gpx, write_gpx};
pub use node::{
    key_by_endpoints, NodePair, PairCosts, PairRoutings, ParseNodeError, PgrNode, Routing,
    VertexCosts, VertexId, VertexPair, VertexRoutings,
};
pub use output::{CostSummary, RoutingSummary, VertexSummary};
pub use pg::PgRouting;
pub use routing::{
    access_cost, get_all_pairs_costs, get_all_pairs_routings, get_costs, get_routes, get_routing,
    get_routing_with, snap_nodes, AccessSpeed, RouteAlgorithm, Snap,
};
