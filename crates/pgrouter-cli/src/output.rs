//! Output formatting for command results.

use std::fmt::Write;

use clap::ValueEnum;
use serde::Serialize;

use pgrouter_lib::{CostSummary, PgrNode, RoutingSummary, VertexId, VertexSummary};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Result of a single command, ready to be printed.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CommandOutput {
    Vertices(Vec<VertexSummary>),
    Distance {
        from: PgrNode,
        to: PgrNode,
        meters: f64,
    },
    VertexCosts(Vec<CostSummary<VertexId>>),
    NodeCosts(Vec<CostSummary<PgrNode>>),
    Routings(Vec<RoutingSummary>),
}

impl CommandOutput {
    /// Render the output in the requested format.
    pub fn render(&self, format: OutputFormat) -> Result<String, serde_json::Error> {
        match format {
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(self)?;
                json.push('\n');
                Ok(json)
            }
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut buffer = String::new();
        match self {
            CommandOutput::Vertices(vertices) => {
                for vertex in vertices {
                    let _ = writeln!(buffer, "{vertex}");
                }
            }
            CommandOutput::Distance { from, to, meters } => {
                let _ = writeln!(buffer, "{from} -> {to}: {meters:.3} m");
            }
            CommandOutput::VertexCosts(costs) => render_costs(&mut buffer, costs),
            CommandOutput::NodeCosts(costs) => render_costs(&mut buffer, costs),
            CommandOutput::Routings(routings) => {
                if routings.is_empty() {
                    let _ = writeln!(buffer, "No routings.");
                }
                for routing in routings {
                    buffer.push_str(&routing.render_plain());
                }
            }
        }
        buffer
    }
}

fn render_costs<T: std::fmt::Display>(buffer: &mut String, costs: &[CostSummary<T>]) {
    if costs.is_empty() {
        let _ = writeln!(buffer, "No costs.");
    }
    for cost in costs {
        let _ = writeln!(buffer, "{cost}");
    }
}
