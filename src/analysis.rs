//! Clustering and segmentation of a pooled dataset
use crate::{
    ClusterModel, Configuration, Dataset, Phase, PipelineConfig, Result, Sample, segment,
    smooth_labels,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Phases of one configuration plus the summary handed to persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationPhases {
    pub configuration: Configuration,
    /// cache size as in the run file names
    pub cache_size: u64,
    /// ordered, covering `[1, end_insn of the last phase]`
    pub phases: Vec<Phase>,
    /// largest timestamp observed, the measured WCET
    pub max_time: f64,
    /// largest cumulative instruction count observed
    pub max_instructions: u64,
    /// eligible samples pooled over all runs
    pub sample_count: usize,
}

/// Labels of one configuration before and after smoothing
#[derive(Debug, Clone)]
pub struct LabeledGroup<'a> {
    pub configuration: Configuration,
    pub samples: &'a [Sample],
    pub raw_labels: Vec<usize>,
    pub smoothed_labels: Vec<usize>,
}

/// Fit the global model on every configuration at once
pub fn fit_model(dataset: &Dataset, config: &PipelineConfig) -> Result<ClusterModel> {
    let features = dataset.feature_matrix();
    log::info!(
        "Fitting {} component mixture on {} samples from {} runs",
        config.num_clusters,
        features.nrows(),
        dataset.num_runs()
    );
    let start = Instant::now();
    let model = ClusterModel::fit(features.view(), config)?;
    log::info!("Mixture fitted in {:.4} seconds", start.elapsed().as_secs_f64());
    Ok(model)
}

/// Label and smooth every configuration with the same model
pub fn label_groups<'a>(
    dataset: &'a Dataset,
    model: &ClusterModel,
    config: &PipelineConfig,
) -> Vec<LabeledGroup<'a>> {
    dataset
        .groups()
        .map(|(configuration, samples)| {
            let raw_labels = model.assign(samples);
            let cumulative: Vec<u64> = samples
                .iter()
                .map(|sample| sample.cumulative_instructions)
                .collect();
            let smoothed_labels = smooth_labels(&cumulative, &raw_labels, config.bucket_size);
            LabeledGroup {
                configuration: *configuration,
                samples,
                raw_labels,
                smoothed_labels,
            }
        })
        .collect()
}

/// Phases of one labeled configuration
pub fn configuration_phases(group: &LabeledGroup, config: &PipelineConfig) -> ConfigurationPhases {
    let configuration = group.configuration;
    if group.samples.is_empty() {
        log::warn!("Configuration {} has no eligible samples", configuration);
    }

    let phases = segment(
        group.samples,
        &group.raw_labels,
        &group.smoothed_labels,
        config.min_span_len,
    );
    if phases.is_empty() && !group.samples.is_empty() {
        log::warn!(
            "Configuration {}: no label span of {} or more samples",
            configuration,
            config.min_span_len
        );
    }
    log::debug!("Configuration {}: {} phases", configuration, phases.len());

    ConfigurationPhases {
        configuration,
        cache_size: configuration.cache_size(),
        phases,
        max_time: group
            .samples
            .iter()
            .map(|sample| sample.timestamp)
            .fold(0.0, f64::max),
        max_instructions: group
            .samples
            .iter()
            .map(|sample| sample.cumulative_instructions)
            .max()
            .unwrap_or(0),
        sample_count: group.samples.len(),
    }
}

/// Run the whole pipeline: fit once, then label, smooth and segment each configuration
pub fn analyze(dataset: &Dataset, config: &PipelineConfig) -> Result<Vec<ConfigurationPhases>> {
    config.validate()?;
    let model = fit_model(dataset, config)?;
    let groups = label_groups(dataset, &model, config);
    Ok(groups
        .iter()
        .map(|group| configuration_phases(group, config))
        .collect())
}
