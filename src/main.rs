mod flow;
mod generate;
mod visualization;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::flow::{
    CancelToken, Driver, DriverConfig, FlowError, FlowNetwork, RunOutcome, SleepPacer, Step,
};
use crate::generate::generate_network;

/// Step-by-step maximum flow and minimum cut on a directed network.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Load the network from a JSON file with `nodes` and `links`
    #[arg(long, conflicts_with = "random")]
    graph: Option<PathBuf>,
    /// Start from a random network with this many nodes
    #[arg(long, value_name = "NODES")]
    random: Option<usize>,
    /// Largest capacity of a randomly generated edge
    #[arg(long, default_value_t = 10)]
    max_capacity: u64,
    /// Seed for the random network
    #[arg(long)]
    seed: Option<u64>,
    /// Pause after highlighting a path, in milliseconds
    #[arg(long, default_value_t = 500)]
    path_pause_ms: u64,
    /// Pause after updating flows and after highlighting the cut, in milliseconds
    #[arg(long, default_value_t = 1000)]
    step_pause_ms: u64,
    /// Write the starting network as JSON to this file
    #[arg(long)]
    export: Option<PathBuf>,
    /// Print the steps of one run instead of opening a window
    #[arg(long)]
    headless: bool,
    #[arg(long, default_value = "1")]
    source: String,
    /// Sink of the headless run, the last node when omitted
    #[arg(long)]
    sink: Option<String>,
}

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("{path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("window failed: {0}")]
    Gui(#[from] eframe::Error),
}

fn load_network(cli: &Cli) -> Result<FlowNetwork, AppError> {
    if let Some(path) = &cli.graph {
        let text = fs::read_to_string(path).map_err(|error| AppError::Io {
            path: path.clone(),
            error,
        })?;
        let network = FlowNetwork::from_snapshot(&serde_json::from_str(&text)?)?;
        info!(
            "loaded {} nodes and {} edges from {}",
            network.node_count(),
            network.edge_count(),
            path.display()
        );
        return Ok(network);
    }

    if let Some(node_count) = cli.random {
        let mut rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        return Ok(generate_network(node_count, cli.max_capacity, &mut rng));
    }

    Ok(FlowNetwork::sample())
}

fn print_step(step: &Step) {
    match step {
        Step::PathHighlighted { path, flow } => {
            println!("path {} carries {}", path.join(" -> "), flow)
        }
        Step::ResidualUpdated { total_flow, edges } => {
            println!("flow so far {}", total_flow);
            for edge in edges {
                println!("  {}", edge);
            }
        }
        Step::CutHighlighted { cut } => {
            let edges: Vec<String> = cut
                .edges
                .iter()
                .map(|(from, to)| format!("{} -> {}", from, to))
                .collect();
            println!(
                "minimum cut {} with capacity {}",
                edges.join(", "),
                cut.capacity
            );
        }
    }
}

fn run_headless(network: &FlowNetwork, driver: &Driver, cli: &Cli) -> Result<(), AppError> {
    let snapshot = network.snapshot();
    let sink = match &cli.sink {
        Some(sink) => sink.clone(),
        None => snapshot
            .nodes
            .last()
            .map(|node| node.id.clone())
            .unwrap_or_default(),
    };
    info!(
        "pausing {:?} after paths and {:?} after flow updates",
        driver.config().path_pause,
        driver.config().residual_pause
    );

    let outcome = driver.run_max_flow(
        &snapshot,
        &cli.source,
        &sink,
        &CancelToken::new(),
        &mut SleepPacer,
        print_step,
    )?;
    match outcome {
        RunOutcome::Finished(result) => println!("maximum flow {}", result.max_flow),
        RunOutcome::Cancelled => println!("run cancelled"),
    }
    Ok(())
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let network = load_network(&cli)?;

    if let Some(path) = &cli.export {
        let json = serde_json::to_string_pretty(&network.snapshot())?;
        fs::write(path, json).map_err(|error| AppError::Io {
            path: path.clone(),
            error,
        })?;
        info!("exported network to {}", path.display());
    }

    let driver = Driver::new(DriverConfig {
        path_pause: Duration::from_millis(cli.path_pause_ms),
        residual_pause: Duration::from_millis(cli.step_pause_ms),
        cut_pause: Duration::from_millis(cli.step_pause_ms),
    });

    if cli.headless {
        return run_headless(&network, &driver, &cli);
    }

    visualization::draw_network(network, Arc::new(driver))?;
    Ok(())
}
