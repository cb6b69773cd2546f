//! Node-to-node routing on top of the vertex-to-vertex pgRouting searches.
//!
//! Free coordinates are snapped to their nearest graph vertex. The database
//! routes between the vertices, and the two access legs (node → vertex and
//! vertex → node) are stitched onto the path. Access legs are costed as the
//! geodesic distance travelled at a fixed [`AccessSpeed`], so every cost
//! is a travel time in seconds when the edge costs are.

use std::fmt;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::RoutingEngine;
use crate::error::{Error, Result};
use crate::gpx::write_gpx;
use crate::node::{PairCosts, PairRoutings, PgrNode, Routing, VertexId};

/// Supported pgRouting search functions for a one-to-one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteAlgorithm {
    /// `pgr_dijkstra`.
    Dijkstra,
    /// `pgr_aStar` (heuristic guided).
    #[default]
    #[serde(rename = "a-star")]
    AStar,
}

impl fmt::Display for RouteAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RouteAlgorithm::Dijkstra => "dijkstra",
            RouteAlgorithm::AStar => "a-star",
        };
        f.write_str(value)
    }
}

/// Travel speed on the access legs between a node and its snapped vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessSpeed {
    kmh: f64,
}

impl AccessSpeed {
    pub const DEFAULT_KMH: f64 = 10.0;

    pub fn from_kmh(kmh: f64) -> Result<Self> {
        if kmh.is_finite() && kmh > 0.0 {
            Ok(Self { kmh })
        } else {
            Err(Error::InvalidSpeed { kmh })
        }
    }

    pub fn kmh(self) -> f64 {
        self.kmh
    }

    pub fn meters_per_second(self) -> f64 {
        self.kmh * 1000.0 / 3600.0
    }
}

impl Default for AccessSpeed {
    fn default() -> Self {
        Self {
            kmh: Self::DEFAULT_KMH,
        }
    }
}

/// Seconds needed to cover `distance_m` metres at `speed`.
pub fn access_cost(distance_m: f64, speed: AccessSpeed) -> f64 {
    distance_m / speed.meters_per_second()
}

/// A node snapped onto the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub vertex: PgrNode,
    pub vertex_id: VertexId,
    /// Cost of the access leg between the node and `vertex`.
    pub access_cost: f64,
}

/// Snap every distinct node to its nearest vertex and cost its access leg.
///
/// The result is keyed by node in first-seen order; duplicated input nodes
/// are looked up once.
pub fn snap_nodes<E>(
    engine: &mut E,
    nodes: &[PgrNode],
    speed: AccessSpeed,
) -> Result<IndexMap<PgrNode, Snap>>
where
    E: RoutingEngine + ?Sized,
{
    let unique: Vec<PgrNode> = nodes
        .iter()
        .copied()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();
    let vertices = engine.find_nearest_vertices(&unique)?;

    let mut snaps = IndexMap::with_capacity(unique.len());
    for (node, vertex) in unique.into_iter().zip(vertices) {
        let vertex_id = vertex.id.ok_or(Error::VertexNotFound {
            lon: node.lon,
            lat: node.lat,
        })?;
        let distance = engine.node_distance(&node, &vertex)?;
        snaps.insert(
            node,
            Snap {
                vertex,
                vertex_id,
                access_cost: access_cost(distance, speed),
            },
        );
    }
    Ok(snaps)
}

/// One-to-one route between two free coordinates using A*.
///
/// Returns an empty map when `start == end`. Otherwise the single entry is
/// keyed by `(start, end)`; its path is `start`, the vertex path, `end`, and
/// its cost adds both access legs to the vertex-to-vertex cost.
pub fn get_routing<E>(
    engine: &mut E,
    start: PgrNode,
    end: PgrNode,
    speed: AccessSpeed,
) -> Result<PairRoutings>
where
    E: RoutingEngine + ?Sized,
{
    get_routing_with(engine, start, end, speed, RouteAlgorithm::AStar)
}

/// One-to-one route between two free coordinates with a chosen search.
pub fn get_routing_with<E>(
    engine: &mut E,
    start: PgrNode,
    end: PgrNode,
    speed: AccessSpeed,
    algorithm: RouteAlgorithm,
) -> Result<PairRoutings>
where
    E: RoutingEngine + ?Sized,
{
    let mut routings = PairRoutings::new();
    if start == end {
        return Ok(routings);
    }

    let snaps = snap_nodes(engine, &[start, end], speed)?;
    let (from, to) = (snaps[&start], snaps[&end]);

    let main = if from.vertex_id == to.vertex_id {
        single_vertex_leg(&from)
    } else {
        let key = (from.vertex_id, to.vertex_id);
        let mut found = match algorithm {
            RouteAlgorithm::AStar => engine.astar(key.0, key.1)?,
            RouteAlgorithm::Dijkstra => engine.dijkstra(&[key.0], &[key.1])?,
        };
        found.swap_remove(&key).ok_or(Error::RouteNotFound {
            start: key.0,
            end: key.1,
        })?
    };

    debug!(%algorithm, %start, %end, cost = main.cost, "routed between vertices");
    routings.insert((start, end), stitch(start, end, &from, &to, main));
    Ok(routings)
}

/// All-pairs routes from `starts` to `ends` (or among `starts` when `ends`
/// is `None`), computed with one many-to-many Dijkstra query.
///
/// Pairs of identical nodes are omitted. Pairs the database has no path for
/// are logged and omitted.
pub fn get_all_pairs_routings<E>(
    engine: &mut E,
    starts: &[PgrNode],
    ends: Option<&[PgrNode]>,
    speed: AccessSpeed,
) -> Result<PairRoutings>
where
    E: RoutingEngine + ?Sized,
{
    let ends = ends.unwrap_or(starts);
    let mut routings = PairRoutings::new();
    if starts.is_empty() || ends.is_empty() {
        return Ok(routings);
    }

    let plan = PairPlan::prepare(engine, starts, ends, speed)?;
    let main = engine.dijkstra(&plan.start_vids, &plan.end_vids)?;

    for &start in starts {
        for &end in ends {
            if start == end {
                continue;
            }
            let (from, to) = (plan.snaps[&start], plan.snaps[&end]);
            let leg = if from.vertex_id == to.vertex_id {
                single_vertex_leg(&from)
            } else if let Some(routing) = main.get(&(from.vertex_id, to.vertex_id)) {
                routing.clone()
            } else {
                warn!(
                    %start,
                    %end,
                    start_vid = from.vertex_id,
                    end_vid = to.vertex_id,
                    "no path between vertices, skipping pair"
                );
                continue;
            };
            routings.insert((start, end), stitch(start, end, &from, &to, leg));
        }
    }
    Ok(routings)
}

/// All-pairs costs without path details, computed with one
/// `pgr_dijkstraCost` query. Same pairing rules as
/// [`get_all_pairs_routings`].
pub fn get_all_pairs_costs<E>(
    engine: &mut E,
    starts: &[PgrNode],
    ends: Option<&[PgrNode]>,
    speed: AccessSpeed,
) -> Result<PairCosts>
where
    E: RoutingEngine + ?Sized,
{
    let ends = ends.unwrap_or(starts);
    let mut costs = PairCosts::new();
    if starts.is_empty() || ends.is_empty() {
        return Ok(costs);
    }

    let plan = PairPlan::prepare(engine, starts, ends, speed)?;
    let main = engine.dijkstra_cost(&plan.start_vids, &plan.end_vids)?;

    for &start in starts {
        for &end in ends {
            if start == end {
                continue;
            }
            let (from, to) = (plan.snaps[&start], plan.snaps[&end]);
            let leg = if from.vertex_id == to.vertex_id {
                0.0
            } else if let Some(cost) = main.get(&(from.vertex_id, to.vertex_id)) {
                *cost
            } else {
                warn!(
                    %start,
                    %end,
                    start_vid = from.vertex_id,
                    end_vid = to.vertex_id,
                    "no path between vertices, skipping pair"
                );
                continue;
            };
            costs.insert((start, end), leg + from.access_cost + to.access_cost);
        }
    }
    Ok(costs)
}

/// Routes from every start to every end.
///
/// A single end (many-to-one or one-to-one) is served by one A* routing per
/// start, and a missing route there is an error. Several ends go through
/// [`get_all_pairs_routings`]. The routings are also saved as GPX when
/// `gpx` names a file.
pub fn get_routes<E>(
    engine: &mut E,
    starts: &[PgrNode],
    ends: &[PgrNode],
    speed: AccessSpeed,
    gpx: Option<&Path>,
) -> Result<PairRoutings>
where
    E: RoutingEngine + ?Sized,
{
    let routings = match ends {
        [end] => {
            let mut routings = PairRoutings::new();
            for &start in starts {
                routings.extend(get_routing(engine, start, *end, speed)?);
            }
            routings
        }
        _ => get_all_pairs_routings(engine, starts, Some(ends), speed)?,
    };

    if let Some(path) = gpx {
        write_gpx(&routings, path)?;
    }
    Ok(routings)
}

/// Costs from every start to every end, dispatched like [`get_routes`]:
/// a single end takes the cost of each A* routing, several ends use
/// [`get_all_pairs_costs`].
pub fn get_costs<E>(
    engine: &mut E,
    starts: &[PgrNode],
    ends: &[PgrNode],
    speed: AccessSpeed,
) -> Result<PairCosts>
where
    E: RoutingEngine + ?Sized,
{
    match ends {
        [end] => {
            let mut costs = PairCosts::new();
            for &start in starts {
                let routings = get_routing(engine, start, *end, speed)?;
                costs.extend(routings.into_iter().map(|(pair, routing)| (pair, routing.cost)));
            }
            Ok(costs)
        }
        _ => get_all_pairs_costs(engine, starts, Some(ends), speed),
    }
}

struct PairPlan {
    snaps: IndexMap<PgrNode, Snap>,
    start_vids: Vec<VertexId>,
    end_vids: Vec<VertexId>,
}

impl PairPlan {
    fn prepare<E>(
        engine: &mut E,
        starts: &[PgrNode],
        ends: &[PgrNode],
        speed: AccessSpeed,
    ) -> Result<Self>
    where
        E: RoutingEngine + ?Sized,
    {
        let nodes: Vec<PgrNode> = starts.iter().chain(ends).copied().collect();
        let snaps = snap_nodes(engine, &nodes, speed)?;
        let vids = |side: &[PgrNode]| -> Vec<VertexId> {
            side.iter()
                .map(|node| snaps[node].vertex_id)
                .collect::<IndexSet<_>>()
                .into_iter()
                .collect()
        };
        let start_vids = vids(starts);
        let end_vids = vids(ends);
        Ok(Self {
            snaps,
            start_vids,
            end_vids,
        })
    }
}

// Both ends snapped onto the same vertex: nothing to search.
fn single_vertex_leg(snap: &Snap) -> Routing {
    Routing::new(vec![snap.vertex], 0.0)
}

fn stitch(start: PgrNode, end: PgrNode, from: &Snap, to: &Snap, main: Routing) -> Routing {
    let mut path = Vec::with_capacity(main.path.len() + 2);
    path.push(start);
    path.extend(main.path);
    path.push(end);
    Routing::new(path, main.cost + from.access_cost + to.access_cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{assert_close, FakeEngine};

    fn speed_1mps() -> AccessSpeed {
        AccessSpeed::from_kmh(3.6).expect("valid speed")
    }

    #[test]
    fn access_speed_converts_kmh() {
        let speed = AccessSpeed::default();
        assert_eq!(speed.kmh(), 10.0);
        assert_close(speed.meters_per_second(), 10.0 / 3.6);
        assert_close(access_cost(100.0, speed_1mps()), 100.0);
    }

    #[test]
    fn access_speed_rejects_non_positive() {
        assert!(matches!(
            AccessSpeed::from_kmh(0.0),
            Err(Error::InvalidSpeed { .. })
        ));
        assert!(AccessSpeed::from_kmh(-5.0).is_err());
        assert!(AccessSpeed::from_kmh(f64::NAN).is_err());
    }

    #[test]
    fn snap_nodes_deduplicates_lookups() {
        let mut engine = FakeEngine::square();
        let a = PgrNode::new(0.0, -0.002);
        let snaps = snap_nodes(&mut engine, &[a, a, a], speed_1mps()).expect("snap");
        assert_eq!(snaps.len(), 1);
        assert_eq!(engine.nearest_calls, 1);
        assert_eq!(snaps[&a].vertex_id, 1);
        assert_close(snaps[&a].access_cost, 2.0);
    }

    #[test]
    fn get_routing_stitches_access_legs() {
        let mut engine = FakeEngine::square();
        let start = PgrNode::new(0.0, -0.002);
        let end = PgrNode::new(1.003, 1.0);
        let routings = get_routing(&mut engine, start, end, speed_1mps()).expect("route");

        let routing = &routings[&(start, end)];
        assert_eq!(routing.path.first(), Some(&start));
        assert_eq!(routing.path.last(), Some(&end));
        let vertex_ids: Vec<_> = routing.path.iter().filter_map(|node| node.id).collect();
        assert_eq!(vertex_ids, vec![1, 2, 3]);
        assert_close(routing.cost, 20.0 + 2.0 + 3.0);
        assert_eq!(engine.astar_calls, vec![(1, 3)]);
    }

    #[test]
    fn get_routing_with_dijkstra_uses_many_to_many_call() {
        let mut engine = FakeEngine::square();
        let start = PgrNode::new(0.0, 0.0);
        let end = PgrNode::new(1.0, 0.0);
        let routings =
            get_routing_with(&mut engine, start, end, speed_1mps(), RouteAlgorithm::Dijkstra)
                .expect("route");
        assert_close(routings[&(start, end)].cost, 10.0);
        assert!(engine.astar_calls.is_empty());
        assert_eq!(engine.dijkstra_calls, vec![(vec![1], vec![2])]);
    }

    #[test]
    fn get_routing_identical_nodes_is_empty() {
        let mut engine = FakeEngine::square();
        let node = PgrNode::new(0.5, 0.5);
        let routings = get_routing(&mut engine, node, node, speed_1mps()).expect("route");
        assert!(routings.is_empty());
        assert_eq!(engine.nearest_calls, 0);
    }

    #[test]
    fn get_routing_same_vertex_skips_search() {
        let mut engine = FakeEngine::square();
        let start = PgrNode::new(0.0, -0.001);
        let end = PgrNode::new(-0.002, 0.0);
        let routings = get_routing(&mut engine, start, end, speed_1mps()).expect("route");

        let routing = &routings[&(start, end)];
        assert_eq!(routing.path.len(), 3);
        assert_eq!(routing.path[1].id, Some(1));
        assert_close(routing.cost, 3.0);
        assert!(engine.astar_calls.is_empty());
    }

    #[test]
    fn get_routing_reports_missing_route() {
        let mut engine = FakeEngine::square();
        engine.vertices.push(PgrNode::vertex(9, 50.0, 50.0));
        let err = get_routing(
            &mut engine,
            PgrNode::new(0.0, 0.0),
            PgrNode::new(50.0, 50.0),
            speed_1mps(),
        )
        .expect_err("vertex 9 is disconnected");
        assert!(matches!(err, Error::RouteNotFound { start: 1, end: 9 }));
    }

    #[test]
    fn get_routing_reports_missing_vertex() {
        let mut engine = FakeEngine::empty();
        let err = get_routing(
            &mut engine,
            PgrNode::new(0.0, 0.0),
            PgrNode::new(1.0, 1.0),
            AccessSpeed::default(),
        )
        .expect_err("graph has no vertices");
        assert!(matches!(err, Error::VertexNotFound { .. }));
    }

    #[test]
    fn all_pairs_routings_cover_every_distinct_pair() {
        let mut engine = FakeEngine::square();
        let nodes = [
            PgrNode::new(0.0, -0.001),
            PgrNode::new(1.0, -0.001),
            PgrNode::new(1.0, 1.001),
        ];
        let routings =
            get_all_pairs_routings(&mut engine, &nodes, None, speed_1mps()).expect("routes");

        assert_eq!(routings.len(), 6);
        let keys: Vec<_> = routings.keys().copied().collect();
        assert_eq!(keys[0], (nodes[0], nodes[1]));
        assert_eq!(keys[1], (nodes[0], nodes[2]));
        assert_eq!(keys[2], (nodes[1], nodes[0]));
        assert_close(routings[&(nodes[0], nodes[2])].cost, 20.0 + 2.0);
        assert_eq!(engine.dijkstra_calls.len(), 1);
        assert_eq!(engine.nearest_calls, 3);
    }

    #[test]
    fn all_pairs_routings_with_separate_ends() {
        let mut engine = FakeEngine::square();
        let starts = [PgrNode::new(0.0, 0.0)];
        let ends = [PgrNode::new(1.0, 0.0), PgrNode::new(0.0, 0.0)];
        let routings = get_all_pairs_routings(&mut engine, &starts, Some(&ends[..]), speed_1mps())
            .expect("routes");

        assert_eq!(routings.len(), 1);
        assert!(routings.contains_key(&(starts[0], ends[0])));
        assert_eq!(engine.dijkstra_calls, vec![(vec![1], vec![2, 1])]);
    }

    #[test]
    fn all_pairs_skip_unreachable_pairs() {
        let mut engine = FakeEngine::square();
        engine.vertices.push(PgrNode::vertex(9, 50.0, 50.0));
        let nodes = [PgrNode::new(0.0, 0.0), PgrNode::new(50.0, 50.0)];

        let routings =
            get_all_pairs_routings(&mut engine, &nodes, None, speed_1mps()).expect("routes");
        assert!(routings.is_empty());

        let costs = get_all_pairs_costs(&mut engine, &nodes, None, speed_1mps()).expect("costs");
        assert!(costs.is_empty());
    }

    #[test]
    fn all_pairs_costs_add_access_legs() {
        let mut engine = FakeEngine::square();
        let a = PgrNode::new(0.0, -0.001);
        let b = PgrNode::new(1.0, 1.004);
        let c = PgrNode::new(-0.002, 0.0);
        let costs =
            get_all_pairs_costs(&mut engine, &[a, b, c], None, speed_1mps()).expect("costs");

        assert_close(costs[&(a, b)], 20.0 + 1.0 + 4.0);
        assert_close(costs[&(b, a)], 20.0 + 4.0 + 1.0);
        assert_close(costs[&(a, c)], 1.0 + 2.0);
        assert_eq!(engine.dijkstra_cost_calls, vec![(vec![1, 3], vec![1, 3])]);
    }

    #[test]
    fn get_routes_with_single_end_uses_astar_per_start() {
        let mut engine = FakeEngine::square();
        let starts = [PgrNode::new(0.0, -0.002), PgrNode::new(1.0, 0.0)];
        let end = PgrNode::new(1.003, 1.0);
        let routings =
            get_routes(&mut engine, &starts, &[end], speed_1mps(), None).expect("routes");

        assert_eq!(routings.len(), 2);
        assert_close(routings[&(starts[0], end)].cost, 20.0 + 2.0 + 3.0);
        assert_close(routings[&(starts[1], end)].cost, 10.0 + 3.0);
        assert_eq!(engine.astar_calls, vec![(1, 3), (2, 3)]);
        assert!(engine.dijkstra_calls.is_empty());
    }

    #[test]
    fn get_routes_with_several_ends_uses_one_dijkstra() {
        let mut engine = FakeEngine::square();
        let starts = [PgrNode::new(0.0, 0.0)];
        let ends = [PgrNode::new(1.0, 0.0), PgrNode::new(1.0, 1.0)];
        let routings =
            get_routes(&mut engine, &starts, &ends, speed_1mps(), None).expect("routes");

        assert_eq!(routings.len(), 2);
        assert!(engine.astar_calls.is_empty());
        assert_eq!(engine.dijkstra_calls, vec![(vec![1], vec![2, 3])]);
    }

    #[test]
    fn get_routes_saves_gpx_when_asked() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("routes.gpx");
        let mut engine = FakeEngine::square();
        let start = PgrNode::new(0.0, 0.0);
        let end = PgrNode::new(1.0, 0.0);

        get_routes(&mut engine, &[start], &[end], speed_1mps(), Some(path.as_path()))
            .expect("routes");
        let document = std::fs::read_to_string(&path).expect("gpx written");
        assert_eq!(document.matches("<trk>").count(), 1);
    }

    #[test]
    fn get_routes_single_end_reports_missing_route() {
        let mut engine = FakeEngine::square();
        engine.vertices.push(PgrNode::vertex(9, 50.0, 50.0));
        let err = get_routes(
            &mut engine,
            &[PgrNode::new(0.0, 0.0)],
            &[PgrNode::new(50.0, 50.0)],
            speed_1mps(),
            None,
        )
        .expect_err("vertex 9 is disconnected");
        assert!(matches!(err, Error::RouteNotFound { start: 1, end: 9 }));
    }

    #[test]
    fn get_costs_with_single_end_takes_astar_costs() {
        let mut engine = FakeEngine::square();
        let a = PgrNode::new(0.0, -0.001);
        let b = PgrNode::new(1.0, 1.004);
        let costs = get_costs(&mut engine, &[a, b], &[b], speed_1mps()).expect("costs");

        assert_eq!(costs.len(), 1);
        assert_close(costs[&(a, b)], 20.0 + 1.0 + 4.0);
        assert_eq!(engine.astar_calls, vec![(1, 3)]);
        assert!(engine.dijkstra_calls.is_empty());
        assert!(engine.dijkstra_cost_calls.is_empty());
    }

    #[test]
    fn get_costs_with_several_ends_uses_dijkstra_cost() {
        let mut engine = FakeEngine::square();
        let a = PgrNode::new(0.0, -0.001);
        let b = PgrNode::new(1.0, 1.004);
        let costs = get_costs(&mut engine, &[a], &[a, b], speed_1mps()).expect("costs");

        assert_eq!(costs.len(), 1);
        assert_close(costs[&(a, b)], 20.0 + 1.0 + 4.0);
        assert!(engine.astar_calls.is_empty());
        assert_eq!(engine.dijkstra_cost_calls, vec![(vec![1], vec![1, 3])]);
    }

    #[test]
    fn all_pairs_with_no_nodes_does_not_query() {
        let mut engine = FakeEngine::square();
        let costs = get_all_pairs_costs(&mut engine, &[], None, speed_1mps()).expect("costs");
        assert!(costs.is_empty());
        assert!(engine.dijkstra_cost_calls.is_empty());
    }
}
