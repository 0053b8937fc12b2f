// run file layout:
// {input_dir}/
// \- {task}_{cache_size}_{mem_bw}_perf_{index}.txt
//
// cache_size is 2^cache_level - 1, index counts from 1

use crate::{Configuration, Dataset, PhaseError, Result, get_tqdm_style, parse_run};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

/// One profiling run on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFile {
    pub configuration: Configuration,
    pub index: usize,
    pub path: PathBuf,
}

pub fn run_file_name(task: &str, cache_size: u64, mem_bw: u32, index: usize) -> String {
    format!("{}_{}_{}_perf_{}.txt", task, cache_size, mem_bw, index)
}

/// Inverse of `run_file_name`: (cache size, memory bandwidth, run index)
pub fn parse_run_file_name(task: &str, file_name: &str) -> Option<(u64, u32, usize)> {
    let rest = file_name.strip_prefix(task)?.strip_prefix('_')?;
    let rest = rest.strip_suffix(".txt")?;
    let parts: Vec<&str> = rest.split('_').collect();
    match parts.as_slice() {
        [cache_size, mem_bw, "perf", index] => Some((
            cache_size.parse().ok()?,
            mem_bw.parse().ok()?,
            index.parse().ok()?,
        )),
        _ => None,
    }
}

/// Cache sizes profiled by default: 2^i - 1 for i in 1..=20
pub fn default_cache_sizes() -> Vec<u64> {
    (1..=20).map(|i| (1u64 << i) - 1).collect()
}

/// Memory bandwidths profiled by default: 72 * i for i in 1..=20
pub fn default_mem_bws() -> Vec<u32> {
    (1..=20).map(|i| 72 * i).collect()
}

/// Every run of the cache size x bandwidth grid, runs 1..=num_per_config
pub fn grid_run_files<P: AsRef<Path>>(
    input_dir: P,
    task: &str,
    cache_sizes: &[u64],
    mem_bws: &[u32],
    num_per_config: usize,
) -> Vec<RunFile> {
    let mut files = vec![];
    for cache_size in cache_sizes {
        for mem_bw in mem_bws {
            for index in 1..=num_per_config {
                files.push(RunFile {
                    configuration: Configuration::from_cache_size(*cache_size, *mem_bw),
                    index,
                    path: input_dir
                        .as_ref()
                        .join(run_file_name(task, *cache_size, *mem_bw, index)),
                });
            }
        }
    }
    files
}

/// Pick up whatever runs of `task` exist in `input_dir`, ordered by configuration and run index
pub fn scan_run_files<P: AsRef<Path>>(
    input_dir: P,
    task: &str,
    num_per_config: usize,
) -> Result<Vec<RunFile>> {
    let input_dir = input_dir.as_ref();
    let mut files = vec![];
    for entry in std::fs::read_dir(input_dir).map_err(|err| PhaseError::io(input_dir, err))? {
        let entry = entry.map_err(|err| PhaseError::io(input_dir, err))?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some((cache_size, mem_bw, index)) = parse_run_file_name(task, file_name) else {
            continue;
        };
        if cache_size == 0 || !(cache_size + 1).is_power_of_two() {
            log::warn!("Skipping {}: cache size is not 2^n - 1", path.display());
            continue;
        }
        if index == 0 || index > num_per_config {
            continue;
        }
        files.push(RunFile {
            configuration: Configuration::from_cache_size(cache_size, mem_bw),
            index,
            path,
        });
    }
    files.sort_by(|left, right| {
        (left.configuration, left.index).cmp(&(right.configuration, right.index))
    });
    Ok(files)
}

/// Parse every run into one dataset.
///
/// Returns the tolerated per-line errors alongside. Any structural error
/// aborts, since clustering needs the complete pool.
pub fn load_dataset(files: &[RunFile]) -> Result<(Dataset, Vec<PhaseError>)> {
    let mut dataset = Dataset::new();
    let mut diagnostics = vec![];

    let pbar = indicatif::ProgressBar::new(files.len() as u64);
    pbar.set_style(get_tqdm_style());
    for file in files {
        log::debug!("Loading file: {}", file.path.display());
        let reader = File::open(&file.path).map_err(|err| PhaseError::io(&file.path, err))?;
        let name = file.path.display().to_string();
        let mut run = parse_run(&name, BufReader::new(reader))?;
        dataset.push_run(file.configuration, &run);
        diagnostics.append(&mut run.diagnostics);
        pbar.inc(1);
    }
    pbar.finish();

    log::info!(
        "Loaded {} runs, {} samples, {} configurations, {} skipped lines",
        dataset.num_runs(),
        dataset.num_samples(),
        dataset.configurations().count(),
        diagnostics.len()
    );
    Ok((dataset, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let name = run_file_name("fft_large", 1023, 144, 3);
        assert_eq!(name, "fft_large_1023_144_perf_3.txt");
        assert_eq!(parse_run_file_name("fft_large", &name), Some((1023, 144, 3)));
        assert_eq!(parse_run_file_name("fft", &name), None);
        assert_eq!(parse_run_file_name("fft_large", "fft_large_1023_144_stat_3.txt"), None);
        assert_eq!(parse_run_file_name("fft_large", "fft_large_1023_144_perf_3.csv"), None);
    }

    #[test]
    fn test_default_grid() {
        let cache_sizes = default_cache_sizes();
        assert_eq!(cache_sizes.len(), 20);
        assert_eq!(cache_sizes[0], 1);
        assert_eq!(cache_sizes[19], (1 << 20) - 1);
        assert_eq!(default_mem_bws()[1], 144);

        let files = grid_run_files("input", "dedup", &[1, 3], &[72], 2);
        assert_eq!(files.len(), 4);
        assert_eq!(files[3].configuration, Configuration::new(2, 72));
        assert_eq!(files[3].path, PathBuf::from("input/dedup_3_72_perf_2.txt"));
    }

    #[test]
    fn test_scan_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let run = "0.1 1000 instructions\n0.1 10 LLC-loads\n0.2 bad instructions\n0.3 2000 instructions\n";
        for name in [
            "canneal_3_72_perf_2.txt",
            "canneal_3_72_perf_1.txt",
            "canneal_1_72_perf_1.txt",
            "canneal_1_72_perf_9.txt",
            "canneal_4_72_perf_1.txt",
            "dedup_1_72_perf_1.txt",
        ] {
            std::fs::write(dir.path().join(name), run).unwrap();
        }

        let files = scan_run_files(dir.path(), "canneal", 5).unwrap();
        let found: Vec<(Configuration, usize)> = files
            .iter()
            .map(|file| (file.configuration, file.index))
            .collect();
        assert_eq!(
            found,
            vec![
                (Configuration::new(1, 72), 1),
                (Configuration::new(2, 72), 1),
                (Configuration::new(2, 72), 2),
            ]
        );

        let (dataset, diagnostics) = load_dataset(&files).unwrap();
        assert_eq!(dataset.num_runs(), 3);
        assert_eq!(dataset.num_samples(), 6);
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = grid_run_files(dir.path(), "fft", &[1], &[72], 1);
        assert!(matches!(load_dataset(&files), Err(PhaseError::Io { .. })));
    }
}
