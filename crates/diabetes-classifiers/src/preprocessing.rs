//! Feature standardization.
//!
//! Provides a per-column mean/std `Scaler`. It is fit once on the training
//! partition and then applied unchanged to the test partition and to every
//! inference request.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::math::Array2;

/// Standard scaler state (per-column mean/std).
///
/// `Scaler::default()` is the unfitted state; transforming with it fails.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    pub const MIN_STD: f64 = 1e-6;

    /// A scaler that leaves values untouched (mean 0, std 1).
    pub fn identity(n_features: usize) -> Self {
        Scaler {
            mean: vec![0.0; n_features],
            std: vec![1.0; n_features],
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.mean.is_empty() && self.mean.len() == self.std.len()
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a single sample.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    fn check_width(&self, ncols: usize) -> Result<()> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted("Scaler"));
        }
        if ncols != self.n_features() {
            return Err(PipelineError::InvalidFeature(format!(
                "expected {} features, got {}",
                self.n_features(),
                ncols
            )));
        }
        Ok(())
    }
}

/// Fit a `Scaler` from an `Array2<f64>` where rows are samples and
/// columns are features. Uses the population standard deviation.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    let (nrows, ncols) = x.shape();
    if nrows == 0 || ncols == 0 {
        return Err(PipelineError::Training(
            "cannot fit a scaler on an empty matrix".to_string(),
        ));
    }

    let mut mean = vec![0.0f64; ncols];
    for row in x.rows() {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    let nrows_f = nrows as f64;
    for v in mean.iter_mut() {
        *v /= nrows_f;
    }

    let mut var = vec![0.0f64; ncols];
    for row in x.rows() {
        for c in 0..ncols {
            let d = row[c] - mean[c];
            var[c] += d * d;
        }
    }
    for v in var.iter_mut() {
        *v = (*v / nrows_f).sqrt().max(Scaler::MIN_STD);
    }

    Ok(Scaler { mean, std: var })
}

/// Transform all rows using the provided `Scaler` and return a new matrix.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>> {
    sc.check_width(x.ncols())?;
    let (nrows, ncols) = x.shape();
    let mut out = Vec::with_capacity(nrows * ncols);

    for row in x.rows() {
        for c in 0..ncols {
            out.push((row[c] - sc.mean[c]) / sc.std[c]);
        }
    }

    Array2::from_shape_vec((nrows, ncols), out).map_err(|e| PipelineError::Training(e.to_string()))
}

/// Convenience: fit a scaler and return it with the transformed matrix.
pub fn fit_transform(x: &Array2<f64>) -> Result<(Scaler, Array2<f64>)> {
    let sc = fit_scaler(x)?;
    let transformed = transform_all(x, &sc)?;
    Ok((sc, transformed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_a_no_op() {
        let sc = Scaler::identity(3);
        assert_eq!(sc.transform_row(&[1.0, -2.0, 3.5]).unwrap(), vec![1.0, -2.0, 3.5]);
    }

    #[test]
    fn unfitted_scaler_is_rejected() {
        let sc = Scaler::default();
        let err = sc.transform_row(&[1.0]).unwrap_err();
        assert!(matches!(err, PipelineError::NotFitted(_)));
    }
}
