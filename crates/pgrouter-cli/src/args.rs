//! Command-line argument definitions.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use pgrouter_lib::{
    AccessSpeed, ConnectionConfig, EdgeTable, PgrNode, Result as LibResult, RouteAlgorithm,
    VertexId,
};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "pgrouter",
    author,
    version,
    about = "Shortest paths, vertex snapping and GPX export over pgRouting"
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// JSON file describing the edge table (missing keys keep their defaults).
    #[arg(long, global = true, value_name = "FILE")]
    pub edge_table: Option<PathBuf>,

    /// Override one edge table key, e.g. `--set table=edge_table --set directed=false`.
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Database connection settings; each falls back to the libpq environment
/// variable of the same purpose.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Database name.
    #[arg(long, short = 'd', global = true, env = "PGDATABASE")]
    pub database: Option<String>,

    /// Database user.
    #[arg(long, short = 'U', global = true, env = "PGUSER")]
    pub user: Option<String>,

    /// Database host.
    #[arg(long, global = true, env = "PGHOST", default_value = "localhost")]
    pub host: String,

    /// Database port.
    #[arg(long, global = true, env = "PGPORT", default_value_t = 5432)]
    pub port: u16,

    /// Database password.
    #[arg(long, global = true, env = "PGPASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    /// Resolve the connection settings. Without an explicit user the current
    /// OS user (`$USER`) is used, as libpq does.
    pub fn to_config(&self) -> Option<ConnectionConfig> {
        let database = self.database.clone()?;
        let user = self
            .user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| database.clone());
        let mut config = ConnectionConfig::new(database, user);
        config.host = self.host.clone();
        config.port = self.port;
        config.password = self.password.clone();
        Some(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Snap coordinates to their nearest graph vertex.
    Nearest {
        /// Coordinates as `lon,lat`.
        #[arg(required = true, value_name = "LON,LAT", allow_hyphen_values = true)]
        nodes: Vec<PgrNode>,
    },
    /// Geodesic distance between two coordinates in metres.
    Distance {
        #[arg(value_name = "LON,LAT", allow_hyphen_values = true)]
        from: PgrNode,
        #[arg(value_name = "LON,LAT", allow_hyphen_values = true)]
        to: PgrNode,
    },
    /// All-pairs costs between vertices without paths (pgr_dijkstraCost).
    DijkstraCost {
        #[command(flatten)]
        vertices: VertexSets,
    },
    /// All-pairs shortest paths between vertices (pgr_dijkstra).
    Dijkstra {
        #[command(flatten)]
        vertices: VertexSets,
        /// Save the paths as a GPX track log.
        #[arg(long, value_name = "FILE")]
        gpx: Option<PathBuf>,
    },
    /// One-to-one shortest path between vertices (pgr_aStar).
    Astar {
        start: VertexId,
        end: VertexId,
        /// Save the path as a GPX track log.
        #[arg(long, value_name = "FILE")]
        gpx: Option<PathBuf>,
    },
    /// Route between two free coordinates, including the access legs.
    Route {
        #[arg(value_name = "LON,LAT", allow_hyphen_values = true)]
        from: PgrNode,
        #[arg(value_name = "LON,LAT", allow_hyphen_values = true)]
        to: PgrNode,
        /// Speed on the access legs to and from the graph, in km/h.
        #[arg(long, default_value_t = AccessSpeed::DEFAULT_KMH)]
        speed: f64,
        /// Search used between the snapped vertices.
        #[arg(long, value_enum, default_value_t = AlgorithmArg::AStar)]
        algorithm: AlgorithmArg,
        /// Save the route as a GPX track log.
        #[arg(long, value_name = "FILE")]
        gpx: Option<PathBuf>,
    },
    /// Routes (or costs) from every node to every end.
    ///
    /// A single `--end` runs one A* search per node; several ends run one
    /// many-to-many Dijkstra query.
    Matrix {
        /// Start coordinate as `lon,lat` (repeatable).
        #[arg(long = "node", required = true, value_name = "LON,LAT", allow_hyphen_values = true)]
        nodes: Vec<PgrNode>,
        /// End coordinate as `lon,lat` (repeatable); defaults to the start nodes.
        #[arg(long = "end", value_name = "LON,LAT", allow_hyphen_values = true)]
        ends: Vec<PgrNode>,
        /// Speed on the access legs to and from the graph, in km/h.
        #[arg(long, default_value_t = AccessSpeed::DEFAULT_KMH)]
        speed: f64,
        /// Report costs only instead of full paths.
        #[arg(long, conflicts_with = "gpx")]
        costs_only: bool,
        /// Save the routes as a GPX track log.
        #[arg(long, value_name = "FILE")]
        gpx: Option<PathBuf>,
    },
}

/// Start and end vertex identifiers for many-to-many searches.
#[derive(Args, Debug, Clone)]
pub struct VertexSets {
    /// Start vertex ids (repeatable or comma separated).
    #[arg(long = "start", required = true, value_delimiter = ',')]
    pub starts: Vec<VertexId>,
    /// End vertex ids (repeatable or comma separated).
    #[arg(long = "end", required = true, value_delimiter = ',')]
    pub ends: Vec<VertexId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    Dijkstra,
    #[value(name = "a-star", alias = "astar")]
    AStar,
}

impl From<AlgorithmArg> for RouteAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Dijkstra => RouteAlgorithm::Dijkstra,
            AlgorithmArg::AStar => RouteAlgorithm::AStar,
        }
    }
}

/// Build the edge table from an optional JSON file plus `KEY=VALUE`
/// overrides, applied in order. Unlike the library's lenient bulk update,
/// a bad override here is an error the user has to fix.
pub fn load_edge_table(path: Option<&Path>, overrides: &[String]) -> LibResult<EdgeTable> {
    let mut table = match path {
        Some(path) => EdgeTable::from_json_file(path)?,
        None => EdgeTable::default(),
    };
    for assignment in overrides {
        let (key, value) = assignment.split_once('=').unwrap_or((assignment.as_str(), ""));
        table.set_str(key.trim(), value.trim())?;
    }
    table.validate()?;
    Ok(table)
}
