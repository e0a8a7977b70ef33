use crate::error::Result;
use crate::math::Array2;

/// Probability at or above which a sample is labelled positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Map a positive-class probability to a 0/1 label.
#[inline]
pub fn label_for(probability: f64) -> u8 {
    u8::from(probability >= DECISION_THRESHOLD)
}

/// Contract shared by every binary classifier in the crate, so the
/// prediction service can swap implementations from configuration.
pub trait ClassifierModel {
    /// Fit the model. `y` holds 0/1 labels, one per row of `x`.
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()>;

    /// Positive-class probability (0..1) per row.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>>;

    /// Labels per row, thresholded at [`DECISION_THRESHOLD`].
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self.predict_proba(x)?.into_iter().map(label_for).collect())
    }

    /// Non-negative per-feature contributions summing to 1.
    fn feature_importances(&self) -> Result<Vec<f64>>;

    /// Whether inputs should be standardized before reaching the model.
    /// Models written against raw clinical units return `false`.
    fn requires_standardized_input(&self) -> bool {
        true
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
