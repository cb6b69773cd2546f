//! SQL text assembly for the pgRouting and PostGIS calls.
//!
//! Table and column names come from the [`EdgeTable`] and are interpolated
//! into the statement text; every builder validates them first. Coordinates
//! and vertex identifiers are always bound as `$n` parameters.

use crate::config::EdgeTable;
use crate::error::Result;

/// Nearest vertex to `($1 lon, $2 lat)` using the PostGIS KNN operator.
pub fn nearest_vertex_sql(edges: &EdgeTable) -> Result<String> {
    edges.validate()?;
    Ok(format!(
        "SELECT id::bigint AS id, lon::double precision AS lon, lat::double precision AS lat \
         FROM {vertices} \
         ORDER BY {geometry} <-> ST_SetSRID(ST_Point($1, $2), {srid}) \
         LIMIT 1",
        vertices = edges.vertices_table(),
        geometry = edges.geometry,
        srid = edges.srid,
    ))
}

/// Geodesic distance in metres between `($1, $2)` and `($3, $4)`.
pub fn node_distance_sql(edges: &EdgeTable) -> String {
    format!(
        "SELECT ST_Distance(\
         ST_SetSRID(ST_Point($1, $2), {srid})::geography, \
         ST_SetSRID(ST_Point($3, $4), {srid})::geography\
         )::double precision AS distance",
        srid = edges.srid,
    )
}

/// Inner edge query handed to `pgr_dijkstra` and `pgr_dijkstraCost`.
///
/// The reverse cost column goes along whenever the table has one; undirected
/// searches still read it for edges whose forward cost is negative.
pub fn edges_sql(edges: &EdgeTable) -> Result<String> {
    edges.validate()?;
    Ok(format!(
        "SELECT {id} AS id, {source} AS source, {target} AS target, {cost} AS cost{reverse} FROM {table}",
        id = edges.id,
        source = edges.source,
        target = edges.target,
        cost = edges.cost,
        reverse = reverse_cost_column(edges, edges.has_reverse_cost),
        table = edges.table,
    ))
}

/// Inner edge query for `pgr_aStar`, which also needs the edge endpoints.
pub fn astar_edges_sql(edges: &EdgeTable) -> Result<String> {
    edges.validate()?;
    Ok(format!(
        "SELECT {id} AS id, {source} AS source, {target} AS target, {cost} AS cost{reverse}, \
         {x1} AS x1, {y1} AS y1, {x2} AS x2, {y2} AS y2 FROM {table}",
        id = edges.id,
        source = edges.source,
        target = edges.target,
        cost = edges.cost,
        reverse = reverse_cost_column(edges, edges.uses_reverse_cost()),
        x1 = edges.x1,
        y1 = edges.y1,
        x2 = edges.x2,
        y2 = edges.y2,
        table = edges.table,
    ))
}

/// Many-to-many aggregate costs between `$1::bigint[]` and `$2::bigint[]`.
pub fn dijkstra_cost_sql(edges: &EdgeTable) -> Result<String> {
    Ok(format!(
        "SELECT start_vid, end_vid, agg_cost \
         FROM pgr_dijkstraCost({inner}, $1::bigint[], $2::bigint[], directed => {directed})",
        inner = quote_literal(&edges_sql(edges)?),
        directed = sql_bool(edges.directed),
    ))
}

/// Many-to-many paths between `$1::bigint[]` and `$2::bigint[]`, joined to
/// the vertices table for coordinates and ordered by `seq`.
pub fn dijkstra_sql(edges: &EdgeTable) -> Result<String> {
    Ok(format!(
        "SELECT r.start_vid, r.end_vid, r.node, r.edge, r.agg_cost, \
         v.lon::double precision AS lon, v.lat::double precision AS lat \
         FROM pgr_dijkstra({inner}, $1::bigint[], $2::bigint[], directed => {directed}) AS r \
         JOIN {vertices} AS v ON r.node = v.id \
         ORDER BY r.seq",
        inner = quote_literal(&edges_sql(edges)?),
        directed = sql_bool(edges.directed),
        vertices = edges.vertices_table(),
    ))
}

/// One-to-one A* path from `$1::bigint` to `$2::bigint`, projected into the
/// same row shape as [`dijkstra_sql`].
pub fn astar_sql(edges: &EdgeTable) -> Result<String> {
    Ok(format!(
        "SELECT $1::bigint AS start_vid, $2::bigint AS end_vid, r.node, r.edge, r.agg_cost, \
         v.lon::double precision AS lon, v.lat::double precision AS lat \
         FROM pgr_aStar({inner}, $1::bigint, $2::bigint, directed => {directed}) AS r \
         JOIN {vertices} AS v ON r.node = v.id \
         ORDER BY r.seq",
        inner = quote_literal(&astar_edges_sql(edges)?),
        directed = sql_bool(edges.directed),
        vertices = edges.vertices_table(),
    ))
}

fn reverse_cost_column(edges: &EdgeTable, include: bool) -> String {
    if include {
        format!(", {} AS reverse_cost", edges.reverse_cost)
    } else {
        String::new()
    }
}

fn sql_bool(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Quote text as a SQL string literal.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
