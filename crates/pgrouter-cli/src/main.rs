use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pgrouter_cli::args::{load_edge_table, Cli};
use pgrouter_cli::commands::Request;
use pgrouter_lib::PgRouting;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let edge_table = load_edge_table(cli.edge_table.as_deref(), &cli.overrides)
        .context("invalid edge table definition")?;
    let request = Request::try_from(cli.command)?;
    let config = cli
        .connection
        .to_config()
        .context("no database given; pass --database or set PGDATABASE")?;

    let mut engine = PgRouting::connect(&config)
        .with_context(|| format!("failed to connect to {config}"))?;
    engine.replace_edge_table(edge_table)?;

    let output = request.run(&mut engine)?;
    let rendered = output.render(cli.format)?;
    io::stdout().write_all(rendered.as_bytes())?;

    engine.close().context("failed to close the database connection")?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
