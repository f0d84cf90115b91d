//! A set of tracking metrics driven together by the training loop.

use burn::tensor::{backend::Backend, Tensor};

use crate::{error::MetricResult, metric::TrainMetric, sink::ScalarSink};

/// Owns the tracking metrics of one training run.
///
/// ```rust,ignore
/// let mut tracker = MetricTracker::new()
///     .with_metric(AdaptiveIoUConfig::new().init::<B>()?)
///     .with_metric(AucConfig::new().init::<B>()?);
///
/// for (step, (pred, gt)) in batches.enumerate() {
///     tracker.update_all(pred, gt);
///     tracker.log_states(&mut sink, "train", step as u64)?;
/// }
/// let epoch = tracker.epoch_values();
/// tracker.reset_epoch_stats();
/// ```
pub struct MetricTracker<B: Backend> {
    metrics: Vec<Box<dyn TrainMetric<B>>>,
}

impl<B: Backend> Default for MetricTracker<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> MetricTracker<B> {
    pub fn new() -> Self {
        Self {
            metrics: Vec::new(),
        }
    }

    /// Adds a metric and returns the tracker.
    pub fn with_metric(mut self, metric: impl TrainMetric<B> + 'static) -> Self {
        self.push(metric);
        self
    }

    pub fn push(&mut self, metric: impl TrainMetric<B> + 'static) {
        self.metrics.push(Box::new(metric));
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn TrainMetric<B>> {
        self.metrics.iter().map(|metric| &**metric)
    }

    /// Feeds one batch to every metric.
    pub fn update_all(&mut self, pred: Tensor<B, 4>, gt: Tensor<B, 4>) {
        for metric in &mut self.metrics {
            metric.update(pred.clone(), gt.clone());
        }
    }

    /// `(name, epoch mean)` of every metric, in insertion order.
    pub fn epoch_values(&self) -> Vec<(String, f64)> {
        self.metrics
            .iter()
            .map(|metric| (metric.name().to_owned(), metric.epoch_value()))
            .collect()
    }

    pub fn reset_epoch_stats(&mut self) {
        for metric in &mut self.metrics {
            metric.reset_epoch_stats();
        }
    }

    /// Logs every metric under `{tag_prefix}/{metric name}`.
    pub fn log_states(
        &self,
        sink: &mut dyn ScalarSink,
        tag_prefix: &str,
        step: u64,
    ) -> MetricResult<()> {
        for metric in &self.metrics {
            let prefix = format!("{tag_prefix}/{}", metric.name());
            metric.log_states(sink, &prefix, step)?;
        }
        Ok(())
    }
}
