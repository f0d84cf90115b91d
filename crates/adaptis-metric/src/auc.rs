//! Ranking metric: precision-recall AUC averaged over the samples of a batch.

use core::marker::PhantomData;

use burn::{
    prelude::*,
    tensor::{backend::Backend, Tensor},
};

use crate::{
    error::MetricResult,
    input::MaskedBatch,
    metric::TrainMetric,
    ranking::compute_ranking_quality,
    sink::ScalarSink,
    state::{
        mean, validate_ema_rate, validate_finite, EpochAccumulator, ExponentialMovingAverage,
    },
};

/// Configuration for the [AUC metric](Auc).
#[derive(Config, Debug)]
pub struct AucConfig {
    /// Share of the previous AUC average kept on every update.
    #[config(default = 0.9)]
    pub ema_rate: f64,
    /// Ground-truth value marking ignored positions.
    #[config(default = "-1.0")]
    pub ignore_label: f64,
    /// Apply a sigmoid to predictions before ranking.
    #[config(default = true)]
    pub from_logits: bool,
    /// Model output the predictions are taken from.
    #[config(default = "String::from(\"instances\")")]
    pub pred_output: String,
    /// Ground-truth entry the targets are taken from.
    #[config(default = "String::from(\"instances\")")]
    pub gt_output: String,
}

impl AucConfig {
    /// Initialize the [AUC metric](Auc).
    pub fn init<B: Backend>(&self) -> MetricResult<Auc<B>> {
        validate_ema_rate("ema_rate", self.ema_rate)?;
        validate_finite("ignore_label", self.ignore_label)?;
        Ok(self.build())
    }

    fn build<B: Backend>(&self) -> Auc<B> {
        Auc {
            score: ExponentialMovingAverage::new(self.ema_rate, 0.0),
            epoch: EpochAccumulator::default(),
            ignore_label: self.ignore_label,
            from_logits: self.from_logits,
            pred_outputs: vec![self.pred_output.clone()],
            gt_outputs: vec![self.gt_output.clone()],
            _b: PhantomData,
        }
    }
}

/// Precision-recall AUC tracked per batch.
///
/// Samples without a positive ground-truth position do not take part in the batch
/// mean; a batch where every sample is skipped leaves the state untouched.
#[derive(Debug, Clone)]
pub struct Auc<B: Backend> {
    score: ExponentialMovingAverage,
    epoch: EpochAccumulator,
    ignore_label: f64,
    from_logits: bool,
    pred_outputs: Vec<String>,
    gt_outputs: Vec<String>,
    _b: PhantomData<B>,
}

impl<B: Backend> Auc<B> {
    /// Creates a metric with the default configuration.
    pub fn new() -> Self {
        AucConfig::new().build()
    }

    /// Moving average of the batch AUC.
    pub const fn ema_score(&self) -> f64 {
        self.score.value()
    }

    /// Number of batches folded into the current epoch.
    pub const fn epoch_batches(&self) -> usize {
        self.epoch.count()
    }
}

impl<B: Backend> Default for Auc<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> TrainMetric<B> for Auc<B> {
    fn name(&self) -> &str {
        "AUC"
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
            tracing::debug!(metric = "AUC", "skipping batch without positive pixels");
            return;
        };

        let samples = compute_ranking_quality(batch.scores, batch.gt_mask, batch.ignore_mask);
        let Some(auc) = mean(&samples) else {
            return;
        };

        self.score.update(auc);
        self.epoch.push(auc);

        tracing::trace!(auc, samples = samples.len(), "AUC updated");
    }

    fn epoch_value(&self) -> f64 {
        self.epoch.mean()
    }

    fn reset_epoch_stats(&mut self) {
        tracing::debug!(
            metric = "AUC",
            epoch_auc = self.epoch.mean(),
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
        sink.record(&format!("{tag_prefix}_ema"), self.score.value(), step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sink::ScalarHistory,
        tests::{tensor4, TestBackend},
        MetricError,
    };

    fn probability_metric() -> Auc<TestBackend> {
        AucConfig::new().with_from_logits(false).init().unwrap()
    }

    #[test]
    fn auc_epoch_mean_skips_samples_without_positives() {
        let mut metric = probability_metric();
        // Sample 0 has no positive label, sample 1 ranks its positives first
        let pred = tensor4(
            vec![0.7, 0.2, 0.4, 0.9, 0.9, 0.8, 0.1, 0.2],
            [2, 1, 2, 2],
        );
        let gt = tensor4(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0], [2, 1, 2, 2]);

        metric.update(pred, gt);

        assert_eq!(metric.epoch_batches(), 1);
        assert!((metric.epoch_value() - 1.0).abs() < 1e-12);
        assert!((metric.ema_score() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn auc_ignores_batches_without_positives() {
        let mut metric = probability_metric();
        let pred = tensor4(vec![0.5; 8], [2, 1, 2, 2]);
        let gt = tensor4(vec![0.0, -1.0, 0.0, 0.0, -1.0, -1.0, 0.0, 0.0], [2, 1, 2, 2]);

        metric.update(pred, gt);

        assert_eq!(metric.epoch_batches(), 0);
        assert_eq!(metric.ema_score().to_bits(), 0.0_f64.to_bits());
        assert_eq!(metric.epoch_value(), 0.0);
    }

    #[test]
    fn auc_averages_batches_over_the_epoch() {
        let mut metric = probability_metric();
        let perfect = tensor4(vec![0.9, 0.8, 0.2, 0.1], [1, 1, 2, 2]);
        let reversed = tensor4(vec![0.1, 0.2, 0.8, 0.9], [1, 1, 2, 2]);
        let gt = tensor4(vec![1.0, 1.0, 0.0, 0.0], [1, 1, 2, 2]);

        metric.update(perfect, gt.clone());
        metric.update(reversed, gt);

        // Reversed ranking visits (recall, precision) = (0, 0), (0.5, 1/3), (1, 1/2)
        let reversed_auc = 0.5 * (0.0 + 1.0 / 3.0) / 2.0 + 0.5 * (1.0 / 3.0 + 0.5) / 2.0;
        let expected = (1.0 + reversed_auc) / 2.0;
        assert_eq!(metric.epoch_batches(), 2);
        assert!((metric.epoch_value() - expected).abs() < 1e-9);

        metric.reset_epoch_stats();
        assert_eq!(metric.epoch_value(), 0.0);
        assert!(metric.ema_score() > 0.0);
    }

    #[test]
    fn auc_logs_single_ema_scalar() {
        let mut metric = probability_metric();
        let pred = tensor4(vec![0.9, 0.1], [1, 1, 1, 2]);
        let gt = tensor4(vec![1.0, 0.0], [1, 1, 1, 2]);
        metric.update(pred, gt);

        let mut history = ScalarHistory::new();
        metric.log_states(&mut history, "val", 12).unwrap();

        assert_eq!(history.records().len(), 1);
        assert_eq!(history.series("val_ema"), vec![(12, metric.ema_score())]);
        assert_eq!(metric.name(), "AUC");
    }

    #[test]
    fn auc_config_rejects_rate_of_one() {
        let metric = AucConfig::new().with_ema_rate(1.0).init::<TestBackend>();
        assert!(matches!(metric, Err(MetricError::InvalidConfig { .. })));
    }
}
