//! Identify execution phases from performance counter profiles
use clap::Parser;
use dna_phase::{
    AnalysisResult, PipelineConfig, analyze, default_cache_sizes, default_mem_bws,
    grid_run_files, load_dataset, scan_run_files,
};
use std::{path::PathBuf, time::Instant};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Task name or identifier, e.g. canneal, dedup, fft
    #[arg(short, long)]
    task: String,

    /// Directory containing the {task}_{cache}_{mem}_perf_{index}.txt run files
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Path to result json
    #[arg(short, long)]
    output_path: PathBuf,

    /// Number of mixture components
    #[arg(short, long)]
    num_clusters: Option<usize>,

    /// Number of runs loaded per configuration
    #[arg(long, default_value = "5")]
    num_per_config: usize,

    /// Smoothing bucket width in instructions
    #[arg(short, long)]
    bucket_size: Option<u64>,

    /// Seed of the mixture initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Pipeline configuration in toml, flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Discover configurations from the input directory instead of the default grid
    #[arg(long)]
    scan_input: bool,

    /// Cache sizes of the grid, default 2^i - 1 for i in 1..=20
    #[arg(long, value_delimiter = ',')]
    cache_sizes: Vec<u64>,

    /// Memory bandwidths of the grid, default 72 * i for i in 1..=20
    #[arg(long, value_delimiter = ',')]
    mem_bws: Vec<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(num_clusters) = args.num_clusters {
        config.num_clusters = num_clusters;
    }
    if let Some(bucket_size) = args.bucket_size {
        config.bucket_size = bucket_size;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    let files = if args.scan_input {
        scan_run_files(&args.input_dir, &args.task, args.num_per_config)?
    } else {
        let cache_sizes = if args.cache_sizes.is_empty() {
            default_cache_sizes()
        } else {
            args.cache_sizes.clone()
        };
        let mem_bws = if args.mem_bws.is_empty() {
            default_mem_bws()
        } else {
            args.mem_bws.clone()
        };
        grid_run_files(
            &args.input_dir,
            &args.task,
            &cache_sizes,
            &mem_bws,
            args.num_per_config,
        )
    };
    if files.is_empty() {
        anyhow::bail!(
            "No run files of task {} found in {}",
            args.task,
            args.input_dir.display()
        );
    }
    println!("Loading {} run files", files.len());

    let (dataset, diagnostics) = load_dataset(&files)?;
    if !diagnostics.is_empty() {
        println!("Skipped {} malformed lines", diagnostics.len());
    }

    let configurations = analyze(&dataset, &config)?;
    let result = AnalysisResult {
        task: args.task.clone(),
        config,
        configurations,
    };

    let empty = result
        .configurations
        .iter()
        .filter(|result| result.phases.is_empty())
        .count();
    if empty > 0 {
        println!("{} configurations have no phases", empty);
    }

    result.save(&args.output_path)?;
    println!("Phases written to {}", args.output_path.display());
    println!(
        "Total execution time: {:.2} seconds",
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
