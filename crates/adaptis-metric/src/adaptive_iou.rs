//! IoU metric with an adaptively tuned binarization threshold.
//!
//! On every batch the metric scores three candidate thresholds, the current one and
//! one step on each side, and moves its working threshold a fraction of the way
//! toward the best one:
//! ```text
//! threshold = threshold_ema_rate * threshold + (1 - threshold_ema_rate) * best_threshold
//! ema_iou   = score_ema_rate * ema_iou + (1 - score_ema_rate) * best_iou
//! ```
//! so a single batch can move the threshold by at most
//! `(1 - threshold_ema_rate) * threshold_step`.

use core::marker::PhantomData;

use burn::{
    prelude::*,
    tensor::{backend::Backend, Tensor},
};

use crate::{
    error::{MetricError, MetricResult},
    input::MaskedBatch,
    metric::TrainMetric,
    overlap::compute_overlap,
    sink::ScalarSink,
    state::{
        mean, validate_ema_rate, validate_finite, EpochAccumulator, ExponentialMovingAverage,
    },
};

/// Configuration for the [adaptive IoU metric](AdaptiveIoU).
#[derive(Config, Debug)]
pub struct AdaptiveIoUConfig {
    /// Threshold used before the first batch.
    #[config(default = 0.4)]
    pub init_threshold: f64,
    /// Distance between the current threshold and each alternative candidate.
    #[config(default = 0.025)]
    pub threshold_step: f64,
    /// Share of the previous threshold kept on every update.
    #[config(default = 0.99)]
    pub threshold_ema_rate: f64,
    /// Share of the previous IoU average kept on every update.
    #[config(default = 0.9)]
    pub score_ema_rate: f64,
    /// Ground-truth value marking ignored positions.
    #[config(default = "-1.0")]
    pub ignore_label: f64,
    /// Apply a sigmoid to predictions before thresholding.
    #[config(default = true)]
    pub from_logits: bool,
    /// Model output the predictions are taken from.
    #[config(default = "String::from(\"instances\")")]
    pub pred_output: String,
    /// Ground-truth entry the targets are taken from.
    #[config(default = "String::from(\"instances\")")]
    pub gt_output: String,
}

impl AdaptiveIoUConfig {
    /// Initialize the [adaptive IoU metric](AdaptiveIoU).
    pub fn init<B: Backend>(&self) -> MetricResult<AdaptiveIoU<B>> {
        self.validate()?;
        Ok(self.build())
    }

    fn build<B: Backend>(&self) -> AdaptiveIoU<B> {
        AdaptiveIoU {
            threshold: ExponentialMovingAverage::new(
                self.threshold_ema_rate,
                self.init_threshold,
            ),
            threshold_step: self.threshold_step,
            score: ExponentialMovingAverage::new(self.score_ema_rate, 0.0),
            epoch: EpochAccumulator::default(),
            ignore_label: self.ignore_label,
            from_logits: self.from_logits,
            pred_outputs: vec![self.pred_output.clone()],
            gt_outputs: vec![self.gt_output.clone()],
            _b: PhantomData,
        }
    }

    fn validate(&self) -> MetricResult<()> {
        validate_finite("init_threshold", self.init_threshold)?;
        validate_finite("ignore_label", self.ignore_label)?;
        validate_ema_rate("threshold_ema_rate", self.threshold_ema_rate)?;
        validate_ema_rate("score_ema_rate", self.score_ema_rate)?;
        validate_finite("threshold_step", self.threshold_step)?;
        if self.threshold_step <= 0.0 {
            return Err(MetricError::InvalidConfig {
                reason: format!(
                    "threshold_step must be positive, got {}",
                    self.threshold_step
                ),
            });
        }
        Ok(())
    }
}

/// IoU tracked with an adaptive binarization threshold.
#[derive(Debug, Clone)]
pub struct AdaptiveIoU<B: Backend> {
    threshold: ExponentialMovingAverage,
    threshold_step: f64,
    score: ExponentialMovingAverage,
    epoch: EpochAccumulator,
    ignore_label: f64,
    from_logits: bool,
    pred_outputs: Vec<String>,
    gt_outputs: Vec<String>,
    _b: PhantomData<B>,
}

impl<B: Backend> AdaptiveIoU<B> {
    /// Creates a metric with the default configuration.
    pub fn new() -> Self {
        AdaptiveIoUConfig::new().build()
    }

    /// Current working threshold.
    pub const fn threshold(&self) -> f64 {
        self.threshold.value()
    }

    /// Moving average of the best IoU per batch.
    pub const fn ema_score(&self) -> f64 {
        self.score.value()
    }

    /// Number of batches folded into the current epoch.
    pub const fn epoch_batches(&self) -> usize {
        self.epoch.count()
    }

    /// Mean IoU of `batch` binarized at `threshold`.
    fn mean_iou<const D: usize>(batch: &MaskedBatch<B, D>, threshold: f64) -> Option<f64> {
        let iou = compute_overlap(
            batch.scores.clone().greater_elem(threshold),
            batch.gt_mask.clone(),
            batch.ignore_mask.clone(),
            false,
        );
        mean(&iou)
    }
}

impl<B: Backend> Default for AdaptiveIoU<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> TrainMetric<B> for AdaptiveIoU<B> {
    fn name(&self) -> &str {
        "AdaptiveIoU"
    }

    fn pred_outputs(&self) -> &[String] {
        &self.pred_outputs
    }

    fn gt_outputs(&self) -> &[String] {
        &self.gt_outputs
    }

    fn update(&mut self, pred: Tensor<B, 4>, gt: Tensor<B, 4>) {
        let Some(batch) = MaskedBatch::prepare(pred, gt, self.ignore_label, self.from_logits)
        else {
            tracing::debug!(metric = "AdaptiveIoU", "skipping batch without positive pixels");
            return;
        };

        let current = self.threshold.value();
        let Some(mut best_iou) = Self::mean_iou(&batch, current) else {
            return;
        };
        let mut best_threshold = current;

        // Alternatives must beat the current threshold strictly
        for candidate in [current - self.threshold_step, current + self.threshold_step] {
            if let Some(iou) = Self::mean_iou(&batch, candidate) {
                if iou > best_iou {
                    best_iou = iou;
                    best_threshold = candidate;
                }
            }
        }

        self.threshold.update(best_threshold);
        self.score.update(best_iou);
        self.epoch.push(best_iou);

        tracing::trace!(
            best_threshold,
            best_iou,
            threshold = self.threshold.value(),
            "adaptive IoU updated"
        );
    }

    fn epoch_value(&self) -> f64 {
        self.epoch.mean()
    }

    fn reset_epoch_stats(&mut self) {
        tracing::debug!(
            metric = "AdaptiveIoU",
            epoch_iou = self.epoch.mean(),
            batches = self.epoch.count(),
            "resetting epoch stats"
        );
        self.epoch.reset();
    }

    fn log_states(
        &self,
        sink: &mut dyn ScalarSink,
        tag_prefix: &str,
        step: u64,
    ) -> MetricResult<()> {
        sink.record(&format!("{tag_prefix}_ema_iou"), self.score.value(), step)?;
        sink.record(
            &format!("{tag_prefix}_iou_thresh"),
            self.threshold.value(),
            step,
        )
    }
}
