use crate::{PhaseError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bucket width for label smoothing, in instructions
pub const DEFAULT_BUCKET_SIZE: u64 = 10_000_000;

/// Knobs of the clustering and segmentation pipeline
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Number of mixture components
    pub num_clusters: usize,
    /// Width of the smoothing buckets in instructions
    pub bucket_size: u64,
    /// Seed of the mixture model initialization
    pub seed: u64,
    /// EM iterations per run
    pub max_iterations: u64,
    /// EM convergence threshold on the lower bound
    pub tolerance: f64,
    /// Added to the covariance diagonal to keep it invertible
    pub reg_covariance: f64,
    /// Number of EM restarts, the best one is kept
    pub n_runs: u64,
    /// Shortest run of equal smoothed labels kept as its own phase
    pub min_span_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            num_clusters: 5,
            bucket_size: DEFAULT_BUCKET_SIZE,
            seed: 42,
            max_iterations: 100,
            tolerance: 1e-3,
            reg_covariance: 1e-6,
            n_runs: 1,
            min_span_len: 2,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|err| PhaseError::io(path, err))?;
        let config: PipelineConfig =
            toml::from_str(&content).map_err(|err| PhaseError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_clusters == 0 {
            return Err(PhaseError::InvalidParameter(
                "num_clusters must be positive".into(),
            ));
        }
        if self.bucket_size == 0 {
            return Err(PhaseError::InvalidParameter(
                "bucket_size must be positive".into(),
            ));
        }
        if self.n_runs == 0 || self.max_iterations == 0 {
            return Err(PhaseError::InvalidParameter(
                "n_runs and max_iterations must be positive".into(),
            ));
        }
        if !(self.tolerance > 0.0) || !(self.reg_covariance >= 0.0) {
            return Err(PhaseError::InvalidParameter(format!(
                "tolerance {} / reg_covariance {} out of range",
                self.tolerance, self.reg_covariance
            )));
        }
        if self.min_span_len == 0 {
            return Err(PhaseError::InvalidParameter(
                "min_span_len must be positive".into(),
            ));
        }
        Ok(())
    }
}
