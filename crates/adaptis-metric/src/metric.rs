//! The contract shared by every tracking metric.

use burn::tensor::{backend::Backend, Tensor};

use crate::{error::MetricResult, sink::ScalarSink};

/// A metric driven by the training loop once per mini-batch.
///
/// Each metric keeps a long-running exponential moving average, never reset, and an
/// epoch accumulator that the loop reads with [`epoch_value`](Self::epoch_value) and
/// clears with [`reset_epoch_stats`](Self::reset_epoch_stats) at every epoch boundary.
///
/// Inputs are `[batch_size, channels, height, width]` tensors: `pred` holds logits or
/// probabilities, `gt` holds `0` for negative, `> 0` for positive and the metric's
/// ignore label for ignored positions.
pub trait TrainMetric<B: Backend> {
    /// Display name of the metric.
    fn name(&self) -> &str;

    /// Names of the model outputs this metric consumes.
    fn pred_outputs(&self) -> &[String];

    /// Names of the ground-truth entries this metric consumes.
    fn gt_outputs(&self) -> &[String];

    /// Folds one batch into the running state.
    ///
    /// A batch without any positive ground-truth position leaves the state untouched.
    fn update(&mut self, pred: Tensor<B, 4>, gt: Tensor<B, 4>);

    /// Mean of the per-batch scores of the current epoch, `0.0` before the first batch.
    fn epoch_value(&self) -> f64;

    /// Clears the epoch accumulator. Moving averages are kept.
    fn reset_epoch_stats(&mut self);

    /// Writes the running state to `sink` under tags starting with `tag_prefix`.
    fn log_states(
        &self,
        _sink: &mut dyn ScalarSink,
        _tag_prefix: &str,
        _step: u64,
    ) -> MetricResult<()> {
        Ok(())
    }
}
