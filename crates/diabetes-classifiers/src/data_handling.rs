//! Dataset schema and in-memory table helpers.
//!
//! This module defines the fixed clinical feature schema, the `Dataset`
//! table (feature matrix + binary outcome), the deterministic train/test
//! split and the per-feature summary logged before training.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::math::Array2;

pub const N_FEATURES: usize = 8;

/// Feature columns, in the order every model is trained and queried with.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

pub const OUTCOME_COLUMN: &str = "Outcome";

pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Labelled samples: `x` is N x 8, `y` holds 0/1 outcomes.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Vec<u8>,
}

impl Dataset {
    pub fn new(x: Array2<f64>, y: Vec<u8>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Training(format!(
                "feature rows ({}) and labels ({}) differ in length",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(bad) = y.iter().find(|&&l| l > 1) {
            return Err(PipelineError::Training(format!(
                "labels must be 0 or 1, found {}",
                bad
            )));
        }
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn n_positive(&self) -> usize {
        self.y.iter().filter(|&&l| l == 1).count()
    }

    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select_rows(indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }

    /// Shuffle with a fixed seed and split into (train, test).
    ///
    /// The test partition holds `ceil(n * test_fraction)` samples; both
    /// partitions must end up non-empty.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        let n = self.len();
        let n_test = (n as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(PipelineError::Training(format!(
                "cannot split {} samples with test_fraction {}",
                n, test_fraction
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let (test_idx, train_idx) = indices.split_at(n_test);
        log::trace!(
            "Split {} samples into {} train / {} test (seed {})",
            n,
            train_idx.len(),
            test_idx.len(),
            seed
        );
        Ok((self.select(train_idx), self.select(test_idx)))
    }

    pub fn summary(&self) -> DatasetSummary {
        let features = (0..self.x.ncols())
            .map(|col| {
                let name = FEATURE_NAMES
                    .get(col)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("feature_{}", col));
                FeatureStats::from_values(name, self.x.column(col))
            })
            .collect();
        let positive = self.n_positive();
        DatasetSummary {
            n_samples: self.len(),
            n_positive: positive,
            n_negative: self.len() - positive,
            positive_rate: if self.is_empty() {
                0.0
            } else {
                positive as f64 / self.len() as f64
            },
            features,
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        log::info!("----- Input Data Summary -----");
        log::info!(
            "{} samples: {} positive and {} negative outcomes ({:.1}% positive)",
            summary.n_samples,
            summary.n_positive,
            summary.n_negative,
            summary.positive_rate * 100.0
        );
        for f in &summary.features {
            log::debug!(
                "{:<26} mean={:>9.3} std={:>9.3} min={:>8.3} median={:>8.3} max={:>8.3}",
                f.name,
                f.mean,
                f.std,
                f.min,
                f.median,
                f.max
            );
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub mean: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl FeatureStats {
    fn from_values(name: String, mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self {
                name,
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
                median: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        values.sort_by(|a, b| a.total_cmp(b));
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };
        Self {
            name,
            mean,
            std,
            min: values[0],
            max: values[values.len() - 1],
            median,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub n_samples: usize,
    pub n_positive: usize,
    pub n_negative: usize,
    pub positive_rate: f64,
    pub features: Vec<FeatureStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy(n: usize) -> Dataset {
        let rows: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64; N_FEATURES]).collect();
        let y = (0..n).map(|i| (i % 2) as u8).collect();
        Dataset::new(Array2::from_rows(&rows).unwrap(), y).unwrap()
    }

    #[test]
    fn split_sizes_follow_ceil() {
        let (train, test) = toy(10).train_test_split(0.25, 7).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 7);
    }

    #[test]
    fn split_is_a_partition() {
        let data = toy(20);
        let (train, test) = data.train_test_split(0.2, 1).unwrap();
        let mut seen: Vec<f64> = train
            .x
            .column(0)
            .into_iter()
            .chain(test.x.column(0))
            .collect();
        seen.sort_by(|a, b| a.total_cmp(b));
        let expected: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn split_rejects_too_small_dataset() {
        assert!(toy(1).train_test_split(0.2, 1).is_err());
    }

    #[test]
    fn new_rejects_non_binary_labels() {
        let x = Array2::from_rows(&[[0.0; N_FEATURES]]).unwrap();
        assert!(Dataset::new(x, vec![2]).is_err());
    }

    #[test]
    fn summary_median_even_count() {
        let s = FeatureStats::from_values("a".into(), vec![4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
    }
}
