use crate::{PhaseError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Per-feature standardization fitted once on the pooled dataset
#[derive(Debug, Clone)]
pub struct Normalizer {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl Normalizer {
    pub fn fit(features: ArrayView2<f64>) -> Result<Normalizer> {
        let Some(mean) = features.mean_axis(Axis(0)) else {
            return Err(PhaseError::InvalidParameter(
                "cannot standardize an empty feature matrix".into(),
            ));
        };
        // population deviation, as a standard scaler does
        let std = features.std_axis(Axis(0), 0.0);
        Ok(Normalizer { mean, std })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// `(x - mean) / std`; a feature with zero deviation maps to 0
    pub fn transform(&self, features: ArrayView2<f64>) -> Array2<f64> {
        let mut scaled = &features - &self.mean;
        for (mut column, std) in scaled.axis_iter_mut(Axis(1)).zip(self.std.iter()) {
            if *std == 0.0 {
                column.fill(0.0);
            } else {
                column /= *std;
            }
        }
        scaled
    }
}
