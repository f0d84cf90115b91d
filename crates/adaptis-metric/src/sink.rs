//! Destinations for the scalars emitted by [`TrainMetric::log_states`](crate::TrainMetric::log_states).

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::error::{MetricError, MetricResult};

/// Accepts a named scalar value at a given training step.
pub trait ScalarSink {
    /// Records `value` under `tag` for `step`.
    fn record(&mut self, tag: &str, value: f64, step: u64) -> MetricResult<()>;
}

impl<S: ScalarSink + ?Sized> ScalarSink for &mut S {
    fn record(&mut self, tag: &str, value: f64, step: u64) -> MetricResult<()> {
        (**self).record(tag, value, step)
    }
}

/// One recorded scalar.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    /// Name the scalar was logged under.
    pub tag: String,
    pub value: f64,
    /// Global training step.
    pub step: u64,
}

/// In-memory sink keeping every scalar in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ScalarHistory {
    records: Vec<ScalarRecord>,
}

impl ScalarHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ScalarRecord] {
        &self.records
    }

    /// Most recent value logged under `tag`.
    pub fn latest(&self, tag: &str) -> Option<f64> {
        self.records
            .iter()
            .rev()
            .find(|record| record.tag == tag)
            .map(|record| record.value)
    }

    /// All `(step, value)` pairs logged under `tag`.
    pub fn series(&self, tag: &str) -> Vec<(u64, f64)> {
        self.records
            .iter()
            .filter(|record| record.tag == tag)
            .map(|record| (record.step, record.value))
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl ScalarSink for ScalarHistory {
    fn record(&mut self, tag: &str, value: f64, step: u64) -> MetricResult<()> {
        self.records.push(ScalarRecord::new(tag.to_owned(), value, step));
        Ok(())
    }
}

/// Sink forwarding every scalar to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ScalarSink for TracingSink {
    fn record(&mut self, tag: &str, value: f64, step: u64) -> MetricResult<()> {
        tracing::info!(target: "adaptis_metric::scalars", tag, value, step, "scalar");
        Ok(())
    }
}

/// Sink writing one JSON object per scalar and per line.
///
/// ```text
/// {"tag":"train_ema_iou","value":0.81,"step":1200}
/// ```
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Creates (or truncates) the file at `path` and writes scalars to it.
    pub fn create(path: impl AsRef<Path>) -> MetricResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| MetricError::SinkOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flushes buffered scalars to the underlying writer.
    pub fn flush(&mut self) -> MetricResult<()> {
        self.writer
            .flush()
            .map_err(|source| MetricError::SinkFlush { source })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ScalarSink for JsonLinesSink<W> {
    fn record(&mut self, tag: &str, value: f64, step: u64) -> MetricResult<()> {
        let record = ScalarRecord::new(tag.to_owned(), value, step);
        serde_json::to_writer(&mut self.writer, &record).map_err(|source| {
            MetricError::SinkSerialize {
                tag: tag.to_owned(),
                source,
            }
        })?;
        self.writer
            .write_all(b"\n")
            .map_err(|source| MetricError::SinkWrite {
                tag: tag.to_owned(),
                source,
            })
    }
}
