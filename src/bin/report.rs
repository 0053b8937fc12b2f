//! Summarize phase analysis results
use clap::Parser;
use cli_table::print_stdout;
use dna_phase::{AnalysisResult, phase_table};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Result json paths
    #[arg(short, long)]
    result_path: Vec<PathBuf>,

    /// Also print the phases of this cache size
    #[arg(short, long, requires = "mem_bw")]
    cache_size: Option<u64>,

    /// Also print the phases of this memory bandwidth
    #[arg(short, long, requires = "cache_size")]
    mem_bw: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    for input_file in &args.result_path {
        println!("Loading phase result from {}", input_file.display());
        let result = AnalysisResult::load(input_file)?;
        println!(
            "Task {}: {} clusters, bucket size {}",
            result.task, result.config.num_clusters, result.config.bucket_size
        );
        print_stdout(result.summary_table())?;

        if let (Some(cache_size), Some(mem_bw)) = (args.cache_size, args.mem_bw) {
            let Some(phases) = result.configurations.iter().find(|phases| {
                phases.cache_size == cache_size && phases.configuration.mem_bw == mem_bw
            }) else {
                anyhow::bail!("No configuration with cache {} and mem {}", cache_size, mem_bw);
            };
            println!("Phases of cache {} mem {}:", cache_size, mem_bw);
            print_stdout(phase_table(phases))?;
        }
    }

    Ok(())
}
