//! # AdaptIS Metrics
//!
//! Running quality statistics for segmentation training loops, implemented on top of
//! the Burn framework.
//!
//! Two tracking metrics share the [`TrainMetric`] contract and are driven once per
//! mini-batch:
//!
//! - [`AdaptiveIoU`]: IoU of the binarized prediction, with a binarization threshold
//!   that follows the best of three candidates through an exponential moving average
//! - [`Auc`]: precision-recall AUC of the continuous prediction, averaged over the
//!   samples that have a positive label
//!
//! Both keep a long-running moving average of their score and a per-epoch mean. The
//! pure per-sample computations, [`compute_overlap`] and [`compute_ranking_quality`],
//! are exposed on their own.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use adaptis_metric::{AdaptiveIoUConfig, ScalarHistory, TrainMetric};
//! use burn::prelude::*;
//!
//! # fn example<B: Backend>(pred: Tensor<B, 4>, gt: Tensor<B, 4>) -> adaptis_metric::MetricResult<()> {
//! let mut iou = AdaptiveIoUConfig::new().init::<B>()?;
//! iou.update(pred, gt);
//!
//! let mut history = ScalarHistory::new();
//! iou.log_states(&mut history, "train", 0)?;
//! println!("epoch IoU: {}", iou.epoch_value());
//! iou.reset_epoch_stats();
//! # Ok(())
//! # }
//! ```
//!
//! ## Ground truth encoding
//!
//! - `0`: negative
//! - `> 0`: positive
//! - the configured ignore label (default `-1`): excluded from every computation,
//!   taking precedence over a positive reading

pub mod adaptive_iou;
pub mod auc;
pub mod error;
pub mod input;
pub mod metric;
pub mod overlap;
pub mod ranking;
pub mod sink;
pub mod state;
pub mod tracker;

pub use adaptive_iou::{AdaptiveIoU, AdaptiveIoUConfig};
pub use auc::{Auc, AucConfig};
pub use error::{MetricError, MetricResult};
pub use input::MaskedBatch;
pub use metric::TrainMetric;
pub use overlap::{compute_overlap, IGNORED_SAMPLE};
pub use ranking::{compute_ranking_quality, precision_recall_auc};
pub use sink::{JsonLinesSink, ScalarHistory, ScalarRecord, ScalarSink, TracingSink};
pub use state::{EpochAccumulator, ExponentialMovingAverage};
pub use tracker::MetricTracker;
