use crate::{CounterRow, PhaseError, Result, RunRecords};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Hardware configuration a workload was profiled under
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Configuration {
    /// log2 of (cache size + 1)
    pub cache_level: u32,
    /// memory bandwidth
    pub mem_bw: u32,
}

impl Configuration {
    pub fn new(cache_level: u32, mem_bw: u32) -> Self {
        Configuration {
            cache_level,
            mem_bw,
        }
    }

    /// Build from the cache size as it appears in run file names, e.g. 1023
    pub fn from_cache_size(cache_size: u64, mem_bw: u32) -> Self {
        Configuration {
            cache_level: (cache_size + 1).ilog2(),
            mem_bw,
        }
    }

    /// Cache size as it appears in run file names
    pub fn cache_size(&self) -> u64 {
        (1u64 << self.cache_level) - 1
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache_{}_mem_{}", self.cache_level, self.mem_bw)
    }
}

/// One counter sample with derived features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    pub instruction_count: u64,
    pub l3_requests: u64,
    pub l3_misses: u64,
    pub configuration: Configuration,
    /// instructions per second since the previous sample of the same run
    pub instruction_rate: f64,
    /// running sum of instructions within the run
    pub cumulative_instructions: u64,
}

/// Number of features used for clustering
pub const NUM_FEATURES: usize = 3;

impl Sample {
    /// Feature vector in clustering column order: L3 requests, L3 misses, instruction rate
    pub fn features(&self) -> [f64; NUM_FEATURES] {
        [
            self.l3_requests as f64,
            self.l3_misses as f64,
            self.instruction_rate,
        ]
    }
}

/// Derive samples from the counter rows of one run.
///
/// Rows with zero instructions only anchor the timing of the next row and are
/// dropped after rates and cumulative counts are computed.
pub fn build_samples(configuration: Configuration, rows: &[CounterRow]) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(rows.len());
    let mut prev_time = 0.0;
    let mut cumulative_instructions = 0u64;

    for row in rows {
        let time_diff = row.time - prev_time;
        let instruction_rate = if time_diff == 0.0 {
            0.0
        } else {
            // clock going backwards would give a negative rate
            (row.instructions as f64 / time_diff).max(0.0)
        };
        prev_time = row.time;
        cumulative_instructions += row.instructions;

        if row.instructions == 0 {
            continue;
        }
        samples.push(Sample {
            timestamp: row.time,
            instruction_count: row.instructions,
            l3_requests: row.l3_requests,
            l3_misses: row.l3_misses,
            configuration,
            instruction_rate,
            cumulative_instructions,
        });
    }
    samples
}

/// Pooled samples of every configuration.
///
/// Runs of the same configuration are merged and ordered by cumulative
/// instruction count. This assumes repeated runs are aligned in instruction
/// space, which holds for deterministic workloads only.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    groups: BTreeMap<Configuration, Vec<Sample>>,
    num_runs: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one run. The configuration is registered even if no sample survives filtering.
    pub fn push_run(&mut self, configuration: Configuration, run: &RunRecords) {
        let samples = build_samples(configuration, &run.rows);
        log::debug!(
            "Run {} of {}: {} rows, {} samples",
            run.name,
            configuration,
            run.rows.len(),
            samples.len()
        );
        self.push_samples(configuration, samples);
    }

    pub fn push_samples(&mut self, configuration: Configuration, samples: Vec<Sample>) {
        let group = self.groups.entry(configuration).or_default();
        group.extend(samples);
        // stable, so ties keep run order
        group.sort_by_key(|sample| sample.cumulative_instructions);
        self.num_runs += 1;
    }

    pub fn num_runs(&self) -> usize {
        self.num_runs
    }

    pub fn num_samples(&self) -> usize {
        self.groups.values().map(|group| group.len()).sum()
    }

    pub fn configurations(&self) -> impl Iterator<Item = &Configuration> {
        self.groups.keys()
    }

    /// Groups in configuration order
    pub fn groups(&self) -> impl Iterator<Item = (&Configuration, &[Sample])> {
        self.groups
            .iter()
            .map(|(configuration, samples)| (configuration, samples.as_slice()))
    }

    /// Samples of one configuration, failing if none are eligible
    pub fn group(&self, configuration: &Configuration) -> Result<&[Sample]> {
        match self.groups.get(configuration) {
            Some(samples) if !samples.is_empty() => Ok(samples),
            _ => Err(PhaseError::EmptyConfiguration {
                configuration: *configuration,
            }),
        }
    }

    /// Pooled feature matrix, rows in `groups()` order
    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.num_samples(), NUM_FEATURES));
        let rows = self.groups.values().flatten();
        for (i, sample) in rows.enumerate() {
            for (j, value) in sample.features().iter().enumerate() {
                matrix[[i, j]] = *value;
            }
        }
        matrix
    }
}
