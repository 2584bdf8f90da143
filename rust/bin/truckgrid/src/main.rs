//! `truckgrid` — drive the truck grid data source from the command line.
//!
//! Usage:
//!   truckgrid [-c <config.toml>] [--base-url <url>] load [--take N] [--skip N]
//!             [--sort <column>] [--desc] [--filter <json>]
//!   truckgrid [-c <config.toml>] delete <id>
//!
//! Results are printed as JSON on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use truck_grid::{
    EntityStore, GridAdapter, GridConfig, HttpTruckService, LoadOptions, NoRefresh, SortSpec,
    TracingReporter, Truck, TruckState,
};

/// Truck grid client.
#[derive(Parser, Debug)]
#[command(name = "truckgrid", about = "Truck grid data source")]
struct Cli {
    /// Path to config file.
    #[arg(short = 'c', long = "config", default_value = "truckgrid.toml")]
    config: PathBuf,

    /// Remote service URL (overrides the config file).
    #[arg(long = "base-url")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load one page.
    Load {
        /// Rows per page (defaults to the configured page size).
        #[arg(long)]
        take: Option<usize>,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Column to sort by.
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending.
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Filter expression as grid JSON, e.g. '["brand","=","Volvo"]'.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Delete a truck by id.
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = GridConfig::load(&cli.config)?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    info!("Truck service at {}/{}", config.base_url, config.resource);

    let service = Arc::new(HttpTruckService::from_config(&config));
    let store = EntityStore::with_state(
        TruckState::with_limit(config.page_size),
        service,
        Arc::new(TracingReporter),
    );
    let grid = GridAdapter::new(store, Arc::new(NoRefresh));

    match cli.command {
        Command::Load { take, skip, sort, desc, filter } => {
            let options = load_options(take.unwrap_or(config.page_size), skip, sort, desc, filter)?;
            let result = grid.load(&options).await?;
            grid.on_loaded();

            let rows: Vec<serde_json::Value> = result
                .data
                .iter()
                .map(|t| project(t, &config.columns))
                .collect::<Result<_, _>>()?;
            let out = serde_json::json!({
                "data": rows,
                "totalCount": result.total_count,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Delete { id } => {
            let key = Truck { id, ..Default::default() };
            grid.remove(&key).await?;
            grid.on_removed();
            let removed = !grid.store().select(|s| s.trucks.contains_key(&id));
            println!("{}", serde_json::json!({ "id": id, "removedLocally": removed }));
        }
    }

    Ok(())
}

fn load_options(
    take: usize,
    skip: usize,
    sort: Option<String>,
    desc: bool,
    filter: Option<String>,
) -> anyhow::Result<LoadOptions> {
    let filter = match filter {
        Some(raw) => serde_json::from_str::<serde_json::Value>(&raw)
            .map_err(|e| anyhow::anyhow!("--filter is not valid JSON: {}", e))?,
        None => serde_json::Value::Null,
    };
    let mut options = LoadOptions::from_json(&serde_json::json!({
        "take": take,
        "skip": skip,
        "filter": filter,
    }))?;
    options.sort = sort.map(|selector| SortSpec { selector, desc });
    Ok(options)
}

/// Keep only the configured columns (plus `id`) of a row.
fn project(truck: &Truck, columns: &[String]) -> anyhow::Result<serde_json::Value> {
    let full = serde_json::to_value(truck)?;
    let mut row = serde_json::Map::new();
    row.insert("id".to_string(), full["id"].clone());
    for column in columns {
        if let Some(v) = full.get(column) {
            row.insert(column.clone(), v.clone());
        }
    }
    Ok(serde_json::Value::Object(row))
}
