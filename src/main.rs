use std::path::Path;

use anyhow::Result;
use clap::Parser;
use rayon::prelude::*;

use ssn_engine::config::Config;
use ssn_engine::storage::{self, GraphRepository, JsonRepository};
use ssn_engine::viz;

#[derive(Parser, Debug)]
#[clap(
    name = "ssn-engine",
    about = "Cluster and visualize sequence similarity networks"
)]
struct Cli {
    /// Directory holding persisted networks, one JSON document per category
    #[clap(long, default_value = "ssn_data")]
    data_dir: String,

    /// Enzyme categories to process
    #[clap(long = "category", required = true)]
    categories: Vec<String>,

    /// Output directory for per-threshold render frames
    #[clap(long, default_value = "ssn_results")]
    output_dir: String,

    /// Minimum number of nodes for a cluster
    #[clap(long, default_value = "8")]
    min_cluster_size: usize,

    /// Alignment score the threshold sweep starts from
    #[clap(long, default_value = "400")]
    start_score: i32,

    /// Sweep decrement, applied as a negative step
    #[clap(long, default_value = "5")]
    step: u32,

    /// Seed for the color random source
    #[clap(long, default_value = "7")]
    seed: u64,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let config = Config {
        min_cluster_size: args.min_cluster_size,
        start_score: args.start_score,
        step: -(args.step as i32),
        color_seed: args.seed,
        ..Config::default()
    };

    log::info!("Processing {} categories", args.categories.len());

    // categories are independent; each runs the whole pipeline on its own
    args.categories
        .par_iter()
        .map(|category| process_category(category, &args, &config))
        .collect::<Result<Vec<_>>>()?;

    log::info!("Done. Results saved to {}", args.output_dir);

    Ok(())
}

fn process_category(category: &str, args: &Cli, config: &Config) -> Result<()> {
    let repository = JsonRepository::new(&args.data_dir);

    // 1. Load the persisted network; absent state is not a failure
    let Some(persisted) = repository.load(category)? else {
        log::warn!("No persisted network for {}, skipping", category);
        return Ok(());
    };
    let graph = storage::from_persisted(&persisted);
    let metadata = repository.load_metadata(category)?;

    log::info!(
        "Loaded network for {} with {} nodes and {} edges",
        category,
        graph.node_count(),
        graph.edge_count()
    );

    // 2. Sweep, group, color, lay out and encode
    let frames = viz::cluster_and_visualize(&graph, &metadata, config);

    log::info!("Recorded {} frames for {}", frames.len(), category);

    // 3. Write one frame per recorded threshold
    let out_dir = Path::new(&args.output_dir).join(category);
    storage::save_frames(&frames, &out_dir)?;

    Ok(())
}
