//! Per-sample ranking quality as the area under the precision-recall curve.

use burn::tensor::{backend::Backend, Bool, Int, Tensor};

/// Computes the precision-recall AUC of every sample that has at least one positive label.
///
/// Ignored positions get a score of zero and are never positive. Samples without any
/// positive label are skipped, so the output may be shorter than the batch; the
/// remaining values keep their sample order.
///
/// # Shapes
///
/// - pred: `[batch_size, ...]`
/// - gt_mask: `[batch_size, ...]`
/// - ignore_mask: `[batch_size, ...]`
/// - output: at most `batch_size` values in `[0, 1]`
pub fn compute_ranking_quality<B: Backend, const D: usize>(
    pred: Tensor<B, D>,
    gt_mask: Tensor<B, D, Bool>,
    ignore_mask: Tensor<B, D, Bool>,
) -> Vec<f64> {
    let batch_size = pred.dims()[0];
    if batch_size == 0 {
        return Vec::new();
    }

    let pred: Tensor<B, 2> = pred
        .mask_fill(ignore_mask.clone(), 0.0)
        .reshape([batch_size as i32, -1]);
    let gt: Tensor<B, 2, Int> = gt_mask
        .int()
        .mask_fill(ignore_mask, 0)
        .reshape([batch_size as i32, -1]);

    let [_, sample_len] = pred.dims();
    if sample_len == 0 {
        return Vec::new();
    }

    let scores: Vec<f32> = pred.into_data().iter::<f32>().collect();
    let labels: Vec<bool> = gt.into_data().iter::<i64>().map(|v| v > 0).collect();

    scores
        .chunks(sample_len)
        .zip(labels.chunks(sample_len))
        .filter_map(|(scores, labels)| precision_recall_auc(scores, labels))
        .collect()
}

/// Area under the precision-recall curve of one flattened sample.
///
/// The curve starts at `(recall = 0, precision = 1)` and visits one point per distinct
/// score, from the highest down, until every positive has been recalled. The area is
/// integrated with the trapezoid rule over recall.
///
/// Returns `None` when `labels` holds no positive.
pub fn precision_recall_auc(scores: &[f32], labels: &[bool]) -> Option<f64> {
    debug_assert_eq!(scores.len(), labels.len());

    let positives = labels.iter().filter(|&&label| label).count();
    if positives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut true_positives = 0usize;
    let mut false_positives = 0usize;
    let mut prev_recall = 0.0;
    let mut prev_precision = 1.0;
    let mut area = 0.0;

    let mut i = 0;
    while i < order.len() {
        // Equal scores share one threshold
        let score = scores[order[i]];
        let mut j = i;
        while j < order.len() && scores[order[j]] == score {
            if labels[order[j]] {
                true_positives += 1;
            } else {
                false_positives += 1;
            }
            j += 1;
        }
        // NaN never compares equal; take it as its own threshold
        if j == i {
            if labels[order[i]] {
                true_positives += 1;
            } else {
                false_positives += 1;
            }
            j += 1;
        }

        let precision = true_positives as f64 / (true_positives + false_positives) as f64;
        let recall = true_positives as f64 / positives as f64;
        area += (recall - prev_recall) * (precision + prev_precision) / 2.0;

        if true_positives == positives {
            break;
        }
        prev_recall = recall;
        prev_precision = precision;
        i = j;
    }

    Some(area)
}

#[cfg(test)]
mod tests {
    use burn::tensor::TensorData;

    use super::*;
    use crate::tests::{mask, TestBackend};

    #[test]
    fn auc_is_one_for_perfect_ranking() {
        let scores = [0.9, 0.8, 0.2, 0.1, 0.05];
        let labels = [true, true, false, false, false];

        let auc = precision_recall_auc(&scores, &labels).unwrap();

        assert!((auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn auc_is_none_without_positives() {
        assert_eq!(precision_recall_auc(&[0.3, 0.7], &[false, false]), None);
    }

    #[test]
    fn auc_interleaved_ranking() {
        // precision/recall points: (0.5, 1), (0.5, 0.5), (1, 2/3)
        let scores = [0.9, 0.8, 0.7, 0.6];
        let labels = [true, false, true, false];

        let auc = precision_recall_auc(&scores, &labels).unwrap();

        let expected = 0.5 + 0.5 * (0.5 + 2.0 / 3.0) / 2.0;
        assert!((auc - expected).abs() < 1e-12);
    }

    #[test]
    fn auc_tied_scores_form_a_single_threshold() {
        let scores = [0.5, 0.5, 0.5, 0.5];
        let labels = [true, false, true, false];

        let auc = precision_recall_auc(&scores, &labels).unwrap();

        assert!((auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn auc_stays_within_unit_interval() {
        let scores = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let labels = [true, true, true, false, false, false];

        let auc = precision_recall_auc(&scores, &labels).unwrap();

        assert!((0.0..=1.0).contains(&auc));
    }

    #[test]
    fn ranking_quality_skips_samples_without_positives() {
        let device = Default::default();
        let pred = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.9_f32, 0.1, 0.2, 0.8, 0.9, 0.1], [3, 2]),
            &device,
        );
        let gt = mask(&[0.0, 0.0, 0.0, 1.0, 1.0, 0.0], [3, 2]);
        let ignore = mask(&[0.0; 6], [3, 2]);

        let auc = compute_ranking_quality(pred, gt, ignore);

        assert_eq!(auc.len(), 2);
        assert!(auc.iter().all(|value| (value - 1.0).abs() < 1e-12));
    }

    #[test]
    fn ranking_quality_zeroes_ignored_scores() {
        let device = Default::default();
        // The ignored position carries the highest raw score
        let pred = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.6_f32, 0.99, 0.3, 0.2], [1, 4]),
            &device,
        );
        let gt = mask(&[1.0, 0.0, 0.0, 0.0], [1, 4]);
        let ignore = mask(&[0.0, 1.0, 0.0, 0.0], [1, 4]);

        let auc = compute_ranking_quality(pred, gt, ignore);

        assert_eq!(auc.len(), 1);
        assert!((auc[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ranking_quality_of_empty_batch_is_empty() {
        let pred = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(Vec::<f32>::new(), [0, 4]),
            &Default::default(),
        );
        let gt = mask(&[], [0, 4]);
        let ignore = mask(&[], [0, 4]);

        assert!(compute_ranking_quality(pred, gt, ignore).is_empty());
    }
}
