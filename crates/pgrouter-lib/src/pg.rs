//! PostgreSQL implementation of [`RoutingEngine`] over pgRouting/PostGIS.

use postgres::{Client, NoTls, Row};
use tracing::{debug, info};

use crate::config::{ConnectionConfig, EdgeTable, EdgeTableValue};
use crate::engine::{collect_paths, PathRow, RoutingEngine};
use crate::error::{Error, Result};
use crate::node::{PgrNode, VertexCosts, VertexId, VertexRoutings};
use crate::sql;

// Output columns read back from each statement, in projection order.
const VERTEX_COLUMNS: [&str; 3] = ["id", "lon", "lat"];
const DISTANCE_COLUMNS: [&str; 1] = ["distance"];
const COST_COLUMNS: [&str; 3] = ["start_vid", "end_vid", "agg_cost"];
const PATH_COLUMNS: [&str; 7] = [
    "start_vid",
    "end_vid",
    "node",
    "edge",
    "agg_cost",
    "lon",
    "lat",
];

/// A connection to a pgRouting-enabled database plus the edge table the
/// queries run against.
pub struct PgRouting {
    client: Client,
    edge_table: EdgeTable,
}

impl PgRouting {
    /// Connect using the given settings and the default edge table.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        info!(database = %config, "connecting to routing database");
        let client = config.to_postgres_config().connect(NoTls)?;
        Ok(Self::new(client))
    }

    /// Wrap an already established client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            edge_table: EdgeTable::default(),
        }
    }

    pub fn edge_table(&self) -> &EdgeTable {
        &self.edge_table
    }

    /// Update the edge table definition. Invalid entries are logged and
    /// skipped; returns the number of entries applied.
    pub fn set_edge_table<I, K, V>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<EdgeTableValue>,
    {
        self.edge_table.apply(entries)
    }

    /// Replace the edge table definition wholesale.
    pub fn replace_edge_table(&mut self, edge_table: EdgeTable) -> Result<()> {
        edge_table.validate()?;
        debug!(edge_table = ?edge_table, "edge table replaced");
        self.edge_table = edge_table;
        Ok(())
    }

    /// Close the connection, reporting any error from the server.
    pub fn close(self) -> Result<()> {
        self.client.close()?;
        Ok(())
    }

    fn path_rows(rows: &[Row]) -> Result<Vec<PathRow>> {
        let [start_vid, end_vid, node, edge, agg_cost, lon, lat] = PATH_COLUMNS;
        rows.iter()
            .map(|row| -> Result<PathRow> {
                Ok(PathRow {
                    start_vid: row.try_get(start_vid)?,
                    end_vid: row.try_get(end_vid)?,
                    node: row.try_get(node)?,
                    edge: row.try_get(edge)?,
                    agg_cost: row.try_get(agg_cost)?,
                    lon: row.try_get(lon)?,
                    lat: row.try_get(lat)?,
                })
            })
            .collect()
    }
}

impl RoutingEngine for PgRouting {
    fn nearest_vertex(&mut self, node: &PgrNode) -> Result<Option<PgrNode>> {
        let query = sql::nearest_vertex_sql(&self.edge_table)?;
        let row = self.client.query_opt(query.as_str(), &[&node.lon, &node.lat])?;
        let Some(row) = row else {
            return Ok(None);
        };
        let [id, lon, lat] = VERTEX_COLUMNS;
        let vertex = PgrNode::vertex(row.try_get(id)?, row.try_get(lon)?, row.try_get(lat)?);
        debug!(lon = node.lon, lat = node.lat, vertex = %vertex, "snapped node to vertex");
        Ok(Some(vertex))
    }

    fn node_distance(&mut self, from: &PgrNode, to: &PgrNode) -> Result<f64> {
        let query = sql::node_distance_sql(&self.edge_table);
        let row = self
            .client
            .query_one(query.as_str(), &[&from.lon, &from.lat, &to.lon, &to.lat])?;
        let distance: Option<f64> = row.try_get(DISTANCE_COLUMNS[0])?;
        distance.ok_or(Error::EmptyResult {
            query: "node_distance",
        })
    }

    fn dijkstra_cost(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexCosts> {
        let query = sql::dijkstra_cost_sql(&self.edge_table)?;
        debug!(sql = %query, ?start_vids, ?end_vids, "running pgr_dijkstraCost");
        let rows = self.client.query(query.as_str(), &[&start_vids, &end_vids])?;
        debug!(rows = rows.len(), "pgr_dijkstraCost finished");

        let [start_vid, end_vid, agg_cost] = COST_COLUMNS;
        let mut costs = VertexCosts::with_capacity(rows.len());
        for row in &rows {
            let start: VertexId = row.try_get(start_vid)?;
            let end: VertexId = row.try_get(end_vid)?;
            costs.insert((start, end), row.try_get(agg_cost)?);
        }
        Ok(costs)
    }

    fn dijkstra(
        &mut self,
        start_vids: &[VertexId],
        end_vids: &[VertexId],
    ) -> Result<VertexRoutings> {
        let query = sql::dijkstra_sql(&self.edge_table)?;
        debug!(sql = %query, ?start_vids, ?end_vids, "running pgr_dijkstra");
        let rows = self.client.query(query.as_str(), &[&start_vids, &end_vids])?;
        debug!(rows = rows.len(), "pgr_dijkstra finished");
        Ok(collect_paths(Self::path_rows(&rows)?))
    }

    fn astar(&mut self, start_vid: VertexId, end_vid: VertexId) -> Result<VertexRoutings> {
        let query = sql::astar_sql(&self.edge_table)?;
        debug!(sql = %query, start_vid, end_vid, "running pgr_aStar");
        let rows = self.client.query(query.as_str(), &[&start_vid, &end_vid])?;
        debug!(rows = rows.len(), "pgr_aStar finished");
        Ok(collect_paths(Self::path_rows(&rows)?))
    }
}
