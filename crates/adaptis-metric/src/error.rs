//! Error types for the adaptis-metric crate.
//!
//! Metric updates never fail: batches without signal are skipped silently.
//! Errors only surface while building a metric from its configuration or while
//! writing scalars to a sink.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for metric construction and scalar logging.
#[derive(Error, Debug)]
pub enum MetricError {
    /// Error when a metric configuration holds an unusable value.
    #[error("Invalid metric configuration: {reason}")]
    InvalidConfig {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error when a scalar sink file cannot be created.
    #[error("Failed to open scalar sink: {path}")]
    SinkOpen {
        /// The sink file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Error when writing a scalar to its sink fails.
    #[error("Failed to write scalar `{tag}`")]
    SinkWrite {
        /// Tag of the scalar being written.
        tag: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Error when flushing buffered scalars fails.
    #[error("Failed to flush scalar sink")]
    SinkFlush {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Error when a scalar cannot be serialized.
    #[error("Failed to serialize scalar `{tag}`")]
    SinkSerialize {
        /// Tag of the scalar being serialized.
        tag: String,
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// A specialized `Result` type for metric operations.
pub type MetricResult<T> = Result<T, MetricError>;
