use std::path::PathBuf;

use thiserror::Error;

use crate::node::VertexId;

/// Convenient result alias for the pgRouting client library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when an edge-table key is not part of the table definition.
    #[error("unknown edge table key: {key}")]
    UnknownEdgeTableKey { key: String },

    /// Raised when an edge-table value has the wrong type for its key.
    #[error("invalid value for edge table key {key}: expected {expected}, got {value}")]
    InvalidEdgeTableValue {
        key: String,
        expected: &'static str,
        value: String,
    },

    /// Raised when a table or column name cannot be embedded in SQL text.
    #[error("invalid SQL identifier for {key}: {value:?}")]
    InvalidIdentifier { key: &'static str, value: String },

    /// Raised when the access-leg speed is not a positive finite number.
    #[error("access speed must be a positive number of km/h, got {kmh}")]
    InvalidSpeed { kmh: f64 },

    /// Raised when no graph vertex could be found near a coordinate.
    #[error("cannot find nearest vertex for ({lon}, {lat})")]
    VertexNotFound { lon: f64, lat: f64 },

    /// Raised when the database reports no path between two vertices.
    #[error("no route found between vertex {start} and vertex {end}")]
    RouteNotFound { start: VertexId, end: VertexId },

    /// Raised when a routing without any path nodes is rendered.
    #[error("routing path was empty")]
    EmptyRouting,

    /// Raised when a query that always yields a value returned none.
    #[error("{query} query returned no value")]
    EmptyResult { query: &'static str },

    /// Raised when an edge table definition file could not be read.
    #[error("failed to read edge table definition from {path}: {message}")]
    EdgeTableFile { path: PathBuf, message: String },

    /// Wrapper for PostgreSQL driver errors.
    #[error(transparent)]
    Postgres(#[from] postgres::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
