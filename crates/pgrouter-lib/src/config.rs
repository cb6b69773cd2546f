//! Edge table definition and database connection settings.
//!
//! The edge table describes where the road graph lives: the table name, the
//! columns pgRouting expects (`id`, `source`, `target`, `cost`, ...) and how
//! the graph is to be interpreted (directed, reverse costs, SRID). The
//! defaults match the layout produced by `osm2pgrouting`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Description of the road-graph table and its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EdgeTable {
    pub table: String,
    pub id: String,
    pub source: String,
    pub target: String,
    /// Forward traversal cost column (driving time in seconds by default).
    pub cost: String,
    pub reverse_cost: String,
    pub x1: String,
    pub y1: String,
    pub x2: String,
    pub y2: String,
    pub geometry: String,
    pub has_reverse_cost: bool,
    pub directed: bool,
    pub srid: i32,
}

impl Default for EdgeTable {
    fn default() -> Self {
        Self {
            table: "ways".to_string(),
            id: "gid".to_string(),
            source: "source".to_string(),
            target: "target".to_string(),
            cost: "cost_s".to_string(),
            reverse_cost: "reverse_cost_s".to_string(),
            x1: "x1".to_string(),
            y1: "y1".to_string(),
            x2: "x2".to_string(),
            y2: "y2".to_string(),
            geometry: "the_geom".to_string(),
            has_reverse_cost: true,
            directed: true,
            srid: 4326,
        }
    }
}

/// Keys accepted by [`EdgeTable::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeTableKey {
    Table,
    Id,
    Source,
    Target,
    Cost,
    ReverseCost,
    X1,
    Y1,
    X2,
    Y2,
    Geometry,
    HasReverseCost,
    Directed,
    Srid,
}

impl EdgeTableKey {
    pub const ALL: [EdgeTableKey; 14] = [
        EdgeTableKey::Table,
        EdgeTableKey::Id,
        EdgeTableKey::Source,
        EdgeTableKey::Target,
        EdgeTableKey::Cost,
        EdgeTableKey::ReverseCost,
        EdgeTableKey::X1,
        EdgeTableKey::Y1,
        EdgeTableKey::X2,
        EdgeTableKey::Y2,
        EdgeTableKey::Geometry,
        EdgeTableKey::HasReverseCost,
        EdgeTableKey::Directed,
        EdgeTableKey::Srid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeTableKey::Table => "table",
            EdgeTableKey::Id => "id",
            EdgeTableKey::Source => "source",
            EdgeTableKey::Target => "target",
            EdgeTableKey::Cost => "cost",
            EdgeTableKey::ReverseCost => "reverse_cost",
            EdgeTableKey::X1 => "x1",
            EdgeTableKey::Y1 => "y1",
            EdgeTableKey::X2 => "x2",
            EdgeTableKey::Y2 => "y2",
            EdgeTableKey::Geometry => "geometry",
            EdgeTableKey::HasReverseCost => "has_reverse_cost",
            EdgeTableKey::Directed => "directed",
            EdgeTableKey::Srid => "srid",
        }
    }

    fn expected(self) -> &'static str {
        match self {
            EdgeTableKey::HasReverseCost | EdgeTableKey::Directed => "a boolean",
            EdgeTableKey::Srid => "an integer",
            _ => "a string",
        }
    }
}

impl fmt::Display for EdgeTableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeTableKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EdgeTableKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::UnknownEdgeTableKey { key: s.to_string() })
    }
}

/// A value assigned to an edge-table key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTableValue {
    Text(String),
    Flag(bool),
    Int(i64),
}

impl fmt::Display for EdgeTableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeTableValue::Text(text) => write!(f, "{text:?}"),
            EdgeTableValue::Flag(flag) => write!(f, "{flag}"),
            EdgeTableValue::Int(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for EdgeTableValue {
    fn from(value: &str) -> Self {
        EdgeTableValue::Text(value.to_string())
    }
}

impl From<String> for EdgeTableValue {
    fn from(value: String) -> Self {
        EdgeTableValue::Text(value)
    }
}

impl From<bool> for EdgeTableValue {
    fn from(value: bool) -> Self {
        EdgeTableValue::Flag(value)
    }
}

impl From<i32> for EdgeTableValue {
    fn from(value: i32) -> Self {
        EdgeTableValue::Int(value.into())
    }
}

impl From<i64> for EdgeTableValue {
    fn from(value: i64) -> Self {
        EdgeTableValue::Int(value)
    }
}

impl EdgeTable {
    /// Load an edge table definition from a JSON file. Missing keys take
    /// their default values.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| Error::EdgeTableFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let table: EdgeTable =
            serde_json::from_str(&contents).map_err(|err| Error::EdgeTableFile {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        table.validate()?;
        Ok(table)
    }

    /// Assign a single key. Fails on unknown keys and mistyped values.
    pub fn set(&mut self, key: &str, value: impl Into<EdgeTableValue>) -> Result<()> {
        let key: EdgeTableKey = key.parse()?;
        let value = value.into();
        let mismatch = |value: &EdgeTableValue| Error::InvalidEdgeTableValue {
            key: key.as_str().to_string(),
            expected: key.expected(),
            value: value.to_string(),
        };

        match (key, value) {
            (EdgeTableKey::HasReverseCost, EdgeTableValue::Flag(flag)) => {
                self.has_reverse_cost = flag
            }
            (EdgeTableKey::Directed, EdgeTableValue::Flag(flag)) => self.directed = flag,
            (EdgeTableKey::Srid, EdgeTableValue::Int(srid)) => {
                self.srid = i32::try_from(srid).map_err(|_| mismatch(&EdgeTableValue::Int(srid)))?
            }
            (key, EdgeTableValue::Text(text)) => match self.text_slot(key) {
                Some(slot) => *slot = text,
                None => return Err(mismatch(&EdgeTableValue::Text(text))),
            },
            (_, other) => return Err(mismatch(&other)),
        }
        Ok(())
    }

    /// Assign a key from its textual form, converting the value to the type
    /// the key expects (`directed=false`, `srid=3857`, `table=edges`).
    pub fn set_str(&mut self, key: &str, raw: &str) -> Result<()> {
        let parsed_key: EdgeTableKey = key.parse()?;
        let invalid = || Error::InvalidEdgeTableValue {
            key: key.to_string(),
            expected: parsed_key.expected(),
            value: raw.to_string(),
        };
        let value = match parsed_key {
            EdgeTableKey::HasReverseCost | EdgeTableKey::Directed => {
                EdgeTableValue::Flag(raw.trim().parse::<bool>().map_err(|_| invalid())?)
            }
            EdgeTableKey::Srid => {
                EdgeTableValue::Int(raw.trim().parse::<i64>().map_err(|_| invalid())?)
            }
            _ => EdgeTableValue::Text(raw.to_string()),
        };
        self.set(key, value)
    }

    /// Apply a batch of assignments. Invalid keys or values are logged and
    /// skipped; valid ones are applied. Returns how many were applied.
    pub fn apply<I, K, V>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<EdgeTableValue>,
    {
        let mut applied = 0;
        for (key, value) in entries {
            let key = key.as_ref();
            let value = value.into();
            match self.set(key, value.clone()) {
                Ok(()) => applied += 1,
                Err(Error::UnknownEdgeTableKey { .. }) => {
                    warn!(key, "set_edge_table: invalid key, skipping");
                }
                Err(err) => {
                    warn!(key, value = %value, error = %err, "set_edge_table: invalid value, skipping");
                }
            }
        }
        debug!(edge_table = ?self, "edge table updated");
        applied
    }

    /// Verify that every table and column name is a plain SQL identifier.
    pub fn validate(&self) -> Result<()> {
        for key in EdgeTableKey::ALL {
            if let Some(value) = self.text_value(key) {
                if !is_identifier(value) {
                    return Err(Error::InvalidIdentifier {
                        key: key.as_str(),
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Name of the vertices table pgRouting maintains next to the edges.
    pub fn vertices_table(&self) -> String {
        format!("{}_vertices_pgr", self.table)
    }

    /// Whether `pgr_aStar` gets the reverse cost column.
    pub fn uses_reverse_cost(&self) -> bool {
        self.directed && self.has_reverse_cost
    }

    fn text_value(&self, key: EdgeTableKey) -> Option<&str> {
        let value = match key {
            EdgeTableKey::Table => &self.table,
            EdgeTableKey::Id => &self.id,
            EdgeTableKey::Source => &self.source,
            EdgeTableKey::Target => &self.target,
            EdgeTableKey::Cost => &self.cost,
            EdgeTableKey::ReverseCost => &self.reverse_cost,
            EdgeTableKey::X1 => &self.x1,
            EdgeTableKey::Y1 => &self.y1,
            EdgeTableKey::X2 => &self.x2,
            EdgeTableKey::Y2 => &self.y2,
            EdgeTableKey::Geometry => &self.geometry,
            EdgeTableKey::HasReverseCost | EdgeTableKey::Directed | EdgeTableKey::Srid => {
                return None
            }
        };
        Some(value.as_str())
    }

    fn text_slot(&mut self, key: EdgeTableKey) -> Option<&mut String> {
        let slot = match key {
            EdgeTableKey::Table => &mut self.table,
            EdgeTableKey::Id => &mut self.id,
            EdgeTableKey::Source => &mut self.source,
            EdgeTableKey::Target => &mut self.target,
            EdgeTableKey::Cost => &mut self.cost,
            EdgeTableKey::ReverseCost => &mut self.reverse_cost,
            EdgeTableKey::X1 => &mut self.x1,
            EdgeTableKey::Y1 => &mut self.y1,
            EdgeTableKey::X2 => &mut self.x2,
            EdgeTableKey::Y2 => &mut self.y2,
            EdgeTableKey::Geometry => &mut self.geometry,
            EdgeTableKey::HasReverseCost | EdgeTableKey::Directed | EdgeTableKey::Srid => {
                return None
            }
        };
        Some(slot)
    }
}

/// Plain identifier, optionally qualified by a single schema name.
fn is_identifier(value: &str) -> bool {
    let mut parts = value.split('.');
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, None) => valid_part(name),
        (Some(schema), Some(name), None) => valid_part(schema) && valid_part(name),
        _ => false,
    }
}

/// Connection settings for the routing database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub database: String,
    pub user: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

impl ConnectionConfig {
    pub fn new(database: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            user: user.into(),
            host: default_host(),
            port: default_port(),
            password: None,
        }
    }

    /// Build the driver configuration.
    pub fn to_postgres_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .dbname(&self.database)
            .user(&self.user)
            .host(&self.host)
            .port(self.port);
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgresql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}
