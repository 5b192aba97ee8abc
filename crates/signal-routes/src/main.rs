//! Route Cache CLI
//!
//! Inspects, rebuilds and normalizes persisted signal route documents
//! against a network fixture.
//!
//! Usage:
//!   route-cache --network fixtures/network.json check routes.cfg --json
//!   route-cache --network fixtures/network.json plan --output routes.cfg
//!   route-cache --network fixtures/network.json normalize old.cfg new.cfg

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use network_core::NetworkDirectory;
use serde::Serialize;
use signal_routes::{LoadReport, NetworkFixture, RouteStore, SkipScope};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "route-cache",
    about = "Inspect and rebuild CommNet signal route caches"
)]
struct Args {
    /// Network fixture JSON describing vessels and ground stations
    #[arg(short, long)]
    network: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a route document and report what survives validation
    Check {
        cache: PathBuf,

        /// Print the load report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan routes for every satellite and write a fresh document
    Plan {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Load a document and write back only what validated
    Normalize { input: PathBuf, output: PathBuf },
}

#[derive(Serialize)]
struct CheckReport<'a> {
    generated_at: String,
    cache: String,
    report: &'a LoadReport,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "signal_routes=debug,route_cache=debug,satellite_registry=debug,beam_routing=debug,info"
    } else {
        "signal_routes=info,route_cache=info,warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let session = NetworkFixture::load(&args.network)
        .with_context(|| format!("loading network fixture {}", args.network.display()))?
        .into_session()?;
    let view = session.view();
    info!(
        "Network: {} satellite(s), {} endpoint(s)",
        session.registry.len(),
        view.endpoints().len()
    );

    match args.command {
        Command::Check { cache, json } => {
            let mut store = RouteStore::new();
            let report = store
                .load_file(&cache, &view)
                .with_context(|| format!("reading {}", cache.display()))?;
            summarize(&report);

            if json {
                let out = CheckReport {
                    generated_at: chrono::Utc::now().to_rfc3339(),
                    cache: cache.display().to_string(),
                    report: &report,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
        }
        Command::Plan { output } => {
            let plan = session.planner.plan_all(&view, &session.model)?;
            let mut store = RouteStore::new();
            store.apply_plan(plan);

            for (source, _) in store.iter() {
                match store.best(source) {
                    Some(route) => info!("{}", route),
                    None => warn!("No route to a command station from {}", source),
                }
            }
            save(&store, &output)?;
        }
        Command::Normalize { input, output } => {
            let mut store = RouteStore::new();
            let report = store
                .load_file(&input, &view)
                .with_context(|| format!("reading {}", input.display()))?;
            summarize(&report);
            save(&store, &output)?;
        }
    }

    Ok(())
}

fn summarize(report: &LoadReport) {
    if let Some(reason) = &report.aborted {
        warn!("Load aborted: {}", reason);
        return;
    }
    info!("{}", "=".repeat(60));
    info!("Satellites loaded: {}", report.satellites);
    info!("Routes loaded:     {}", report.routes);
    info!("Links loaded:      {}", report.links);
    info!(
        "Skipped: {} satellite(s), {} route(s), {} antenna(s)",
        report.skipped_in(SkipScope::Satellite),
        report.skipped_in(SkipScope::Route),
        report.skipped_in(SkipScope::Antenna)
    );
    info!("{}", "=".repeat(60));
}

fn save(store: &RouteStore, path: &Path) -> Result<()> {
    store
        .save_file(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
