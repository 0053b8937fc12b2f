use crate::{NUM_FEATURES, Normalizer, PhaseError, PipelineConfig, Result, Sample};
use linfa::{
    Dataset,
    traits::{Fit, Predict},
};
use linfa_clustering::{GaussianMixtureModel, GmmCovarType, GmmInitMethod};
use ndarray::{Array1, Array2, ArrayView2};
use rand_xoshiro::{Xoshiro256Plus, rand_core::SeedableRng};

/// Gaussian mixture fitted once over the pooled, standardized features.
///
/// Labels from one model are comparable across configurations, so the same
/// model must label every configuration.
#[derive(Debug)]
pub struct ClusterModel {
    normalizer: Normalizer,
    gmm: GaussianMixtureModel<f64>,
}

impl ClusterModel {
    /// Standardize `features` and fit the mixture on them
    pub fn fit(features: ArrayView2<f64>, config: &PipelineConfig) -> Result<ClusterModel> {
        config.validate()?;
        if features.ncols() != NUM_FEATURES {
            return Err(PhaseError::InvalidParameter(format!(
                "expected {} feature columns, got {}",
                NUM_FEATURES,
                features.ncols()
            )));
        }
        if features.nrows() < config.num_clusters {
            return Err(PhaseError::ClusteringFailure {
                reason: format!(
                    "{} samples are not enough for {} components",
                    features.nrows(),
                    config.num_clusters
                ),
            });
        }

        let normalizer = Normalizer::fit(features)?;
        let scaled = normalizer.transform(features);
        let dataset = Dataset::from(scaled);

        let rng = Xoshiro256Plus::seed_from_u64(config.seed);
        let gmm = GaussianMixtureModel::params_with_rng(config.num_clusters, rng)
            .covariance_type(GmmCovarType::Full)
            .init_method(GmmInitMethod::KMeans)
            .max_n_iterations(config.max_iterations)
            .n_runs(config.n_runs)
            .tolerance(config.tolerance)
            .reg_covariance(config.reg_covariance)
            .fit(&dataset)
            .map_err(|err| PhaseError::ClusteringFailure {
                reason: err.to_string(),
            })?;

        if gmm.means().iter().any(|value| !value.is_finite()) {
            return Err(PhaseError::ClusteringFailure {
                reason: "mixture means are not finite".into(),
            });
        }

        Ok(ClusterModel { normalizer, gmm })
    }

    pub fn num_clusters(&self) -> usize {
        self.gmm.weights().len()
    }

    /// Mixing weight of each component
    pub fn weights(&self) -> &Array1<f64> {
        self.gmm.weights()
    }

    /// Component means in standardized space
    pub fn means(&self) -> &Array2<f64> {
        self.gmm.means()
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Label raw feature rows with the globally fitted parameters
    pub fn predict(&self, features: ArrayView2<f64>) -> Vec<usize> {
        if features.nrows() == 0 {
            return vec![];
        }
        let scaled = self.normalizer.transform(features);
        let labels: Array1<usize> = self.gmm.predict(&scaled);
        labels.to_vec()
    }

    /// Label samples, one label per sample in order
    pub fn assign(&self, samples: &[Sample]) -> Vec<usize> {
        let mut features = Array2::<f64>::zeros((samples.len(), NUM_FEATURES));
        for (i, sample) in samples.iter().enumerate() {
            for (j, value) in sample.features().iter().enumerate() {
                features[[i, j]] = *value;
            }
        }
        self.predict(features.view())
    }
}
