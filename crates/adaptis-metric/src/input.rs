//! Batch preparation shared by the tracking metrics.
//!
//! Ground truth encodes three categories per position: positive (`> 0`),
//! negative (`0`) and ignored (the configured ignore label).

use burn::tensor::{
    activation::sigmoid, backend::Backend, Bool, ElementConversion, Int, Tensor,
};

/// A batch split into prediction scores and ground-truth masks.
#[derive(Debug, Clone)]
pub struct MaskedBatch<B: Backend, const D: usize> {
    /// Prediction scores, probabilities when the batch was prepared from logits.
    pub scores: Tensor<B, D>,
    /// Positive ground-truth positions, ignored positions excluded.
    pub gt_mask: Tensor<B, D, Bool>,
    /// Positions marked with the ignore label.
    pub ignore_mask: Tensor<B, D, Bool>,
}

impl<B: Backend, const D: usize> MaskedBatch<B, D> {
    /// Derives the masks of a batch.
    ///
    /// Returns `None` when no sample holds a positive ground-truth position, since such
    /// a batch carries no signal for either metric.
    ///
    /// # Panics
    ///
    /// Panics when `pred` and `gt` have different shapes.
    pub fn prepare(
        pred: Tensor<B, D>,
        gt: Tensor<B, D>,
        ignore_label: f64,
        from_logits: bool,
    ) -> Option<Self> {
        assert_eq!(
            pred.dims(),
            gt.dims(),
            "Prediction and ground truth shapes must match"
        );

        let ignore_mask = gt.clone().equal_elem(ignore_label);
        let gt_mask = gt
            .greater_elem(0.0)
            .bool_and(ignore_mask.clone().bool_not());

        if !has_positive(&gt_mask) {
            return None;
        }

        let scores = if from_logits { sigmoid(pred) } else { pred };

        Some(Self {
            scores,
            gt_mask,
            ignore_mask,
        })
    }
}

/// Checks whether any sample has a positive position.
fn has_positive<B: Backend, const D: usize>(gt_mask: &Tensor<B, D, Bool>) -> bool {
    let positives: Tensor<B, 1, Int> = gt_mask.clone().int().sum();
    positives.into_scalar().elem::<i64>() > 0
}
