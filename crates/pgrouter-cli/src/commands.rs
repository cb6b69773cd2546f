//! Command handlers.
//!
//! Parsed arguments become a [`Request`] first, so everything that can be
//! checked without a database (speeds, coordinates) fails before a
//! connection is opened. [`Request::run`] then executes against any
//! [`RoutingEngine`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use pgrouter_lib::{
    get_costs, get_routes, get_routing_with, key_by_endpoints, write_gpx, AccessSpeed, CostSummary,
    PairRoutings, PgrNode, RouteAlgorithm, RoutingEngine, RoutingSummary, VertexId,
    VertexSummary,
};

use crate::args::Command;
use crate::output::CommandOutput;

/// A validated command, ready to run against a routing engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Nearest {
        nodes: Vec<PgrNode>,
    },
    Distance {
        from: PgrNode,
        to: PgrNode,
    },
    DijkstraCost {
        starts: Vec<VertexId>,
        ends: Vec<VertexId>,
    },
    Dijkstra {
        starts: Vec<VertexId>,
        ends: Vec<VertexId>,
        gpx: Option<PathBuf>,
    },
    AStar {
        start: VertexId,
        end: VertexId,
        gpx: Option<PathBuf>,
    },
    Route {
        from: PgrNode,
        to: PgrNode,
        speed: AccessSpeed,
        algorithm: RouteAlgorithm,
        gpx: Option<PathBuf>,
    },
    Matrix {
        nodes: Vec<PgrNode>,
        ends: Option<Vec<PgrNode>>,
        speed: AccessSpeed,
        costs_only: bool,
        gpx: Option<PathBuf>,
    },
}

impl TryFrom<Command> for Request {
    type Error = anyhow::Error;

    fn try_from(command: Command) -> Result<Self> {
        let request = match command {
            Command::Nearest { nodes } => Request::Nearest { nodes },
            Command::Distance { from, to } => Request::Distance { from, to },
            Command::DijkstraCost { vertices } => Request::DijkstraCost {
                starts: vertices.starts,
                ends: vertices.ends,
            },
            Command::Dijkstra { vertices, gpx } => Request::Dijkstra {
                starts: vertices.starts,
                ends: vertices.ends,
                gpx,
            },
            Command::Astar { start, end, gpx } => Request::AStar { start, end, gpx },
            Command::Route {
                from,
                to,
                speed,
                algorithm,
                gpx,
            } => Request::Route {
                from,
                to,
                speed: parse_speed(speed)?,
                algorithm: algorithm.into(),
                gpx,
            },
            Command::Matrix {
                nodes,
                ends,
                speed,
                costs_only,
                gpx,
            } => Request::Matrix {
                nodes,
                ends: (!ends.is_empty()).then_some(ends),
                speed: parse_speed(speed)?,
                costs_only,
                gpx,
            },
        };
        Ok(request)
    }
}

fn parse_speed(kmh: f64) -> Result<AccessSpeed> {
    AccessSpeed::from_kmh(kmh).context("invalid --speed")
}

impl Request {
    /// Execute the request, saving a GPX file when one was asked for.
    pub fn run<E>(&self, engine: &mut E) -> Result<CommandOutput>
    where
        E: RoutingEngine + ?Sized,
    {
        match self {
            Request::Nearest { nodes } => {
                let vertices = engine
                    .find_nearest_vertices(nodes)
                    .context("failed to snap coordinates")?;
                Ok(CommandOutput::Vertices(
                    nodes
                        .iter()
                        .zip(vertices)
                        .map(|(node, vertex)| VertexSummary {
                            node: *node,
                            vertex,
                        })
                        .collect(),
                ))
            }
            Request::Distance { from, to } => {
                let meters = engine
                    .node_distance(from, to)
                    .context("failed to measure distance")?;
                Ok(CommandOutput::Distance {
                    from: *from,
                    to: *to,
                    meters,
                })
            }
            Request::DijkstraCost { starts, ends } => {
                let costs = engine
                    .dijkstra_cost(starts, ends)
                    .context("pgr_dijkstraCost failed")?;
                let summaries = CostSummary::from_vertex_pairs(&costs);
                Ok(CommandOutput::VertexCosts(summaries))
            }
            Request::Dijkstra { starts, ends, gpx } => {
                let routings = engine
                    .dijkstra(starts, ends)
                    .context("pgr_dijkstra failed")?;
                let keyed = key_by_endpoints(&routings)?;
                save_gpx(&keyed, gpx.as_deref())?;
                Ok(CommandOutput::Routings(RoutingSummary::from_pairs(&keyed)))
            }
            Request::AStar { start, end, gpx } => {
                let routings = engine.astar(*start, *end).context("pgr_aStar failed")?;
                let keyed = key_by_endpoints(&routings)?;
                save_gpx(&keyed, gpx.as_deref())?;
                Ok(CommandOutput::Routings(RoutingSummary::from_pairs(&keyed)))
            }
            Request::Route {
                from,
                to,
                speed,
                algorithm,
                gpx,
            } => {
                let routings = get_routing_with(engine, *from, *to, *speed, *algorithm)
                    .with_context(|| format!("failed to route from {from} to {to}"))?;
                save_gpx(&routings, gpx.as_deref())?;
                Ok(CommandOutput::Routings(RoutingSummary::from_pairs(&routings)))
            }
            Request::Matrix {
                nodes,
                ends,
                speed,
                costs_only,
                gpx,
            } => {
                let ends = ends.as_deref().unwrap_or(nodes);
                if *costs_only {
                    let costs = get_costs(engine, nodes, ends, *speed)
                        .context("failed to compute matrix costs")?;
                    return Ok(CommandOutput::NodeCosts(CostSummary::from_pairs(&costs)));
                }
                let routings = get_routes(engine, nodes, ends, *speed, gpx.as_deref())
                    .context("failed to compute matrix routings")?;
                Ok(CommandOutput::Routings(RoutingSummary::from_pairs(&routings)))
            }
        }
    }
}

fn save_gpx(routings: &PairRoutings, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        write_gpx(routings, path)
            .with_context(|| format!("failed to write GPX to {}", path.display()))?;
    }
    Ok(())
}
