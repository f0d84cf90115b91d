//! Per-sample region overlap (IoU) between a binarized prediction and the ground truth.
//!
//! The overlap of a sample is computed as:
//! ```text
//! IoU = |pred ∩ gt| / |pred ∪ gt|
//! ```
//! after every ignored position has been removed from both masks.

use burn::tensor::{backend::Backend, Bool, Int, Tensor};

/// Value reported for a sample with an empty union when ignored samples are kept.
pub const IGNORED_SAMPLE: f64 = -1.0;

/// Computes the overlap ratio of every sample in a batch.
///
/// Ignored positions never count as predicted-positive nor as ground-truth positive.
/// Samples whose union is empty have no defined overlap: they are dropped from the
/// result, or reported as [`IGNORED_SAMPLE`] in their own slot when `keep_ignored` is set.
///
/// # Shapes
///
/// - pred_mask: `[batch_size, ...]`
/// - gt_mask: `[batch_size, ...]`
/// - ignore_mask: `[batch_size, ...]`
/// - output: at most `batch_size` values in `[0, 1]`, in sample order
pub fn compute_overlap<B: Backend, const D: usize>(
    pred_mask: Tensor<B, D, Bool>,
    gt_mask: Tensor<B, D, Bool>,
    ignore_mask: Tensor<B, D, Bool>,
    keep_ignored: bool,
) -> Vec<f64> {
    let batch_size = pred_mask.dims()[0];
    if batch_size == 0 {
        return Vec::new();
    }

    // Flatten everything but the batch dimension: [B, N]
    let pred: Tensor<B, 2, Int> = pred_mask
        .int()
        .mask_fill(ignore_mask.clone(), 0)
        .reshape([batch_size as i32, -1]);
    let gt: Tensor<B, 2, Int> = gt_mask
        .int()
        .mask_fill(ignore_mask, 0)
        .reshape([batch_size as i32, -1]);

    let intersection = (pred.clone() * gt.clone()).sum_dim(1);
    let union = pred.sum_dim(1) + gt.sum_dim(1) - intersection.clone();

    let intersection = intersection.into_data();
    let union = union.into_data();

    intersection
        .iter::<i64>()
        .zip(union.iter::<i64>())
        .filter_map(|(intersection, union)| {
            if union > 0 {
                Some(intersection as f64 / union as f64)
            } else if keep_ignored {
                Some(IGNORED_SAMPLE)
            } else {
                None
            }
        })
        .collect()
}
