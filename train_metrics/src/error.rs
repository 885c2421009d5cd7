//! Error types for metric tracking and cross-worker aggregation.

use std::io;

use thiserror::Error;

/// Errors raised by meters, the metric logger and the accuracy helpers.
#[derive(Debug, Error)]
pub enum MetricError {
    /// A window statistic was requested before any value was recorded.
    #[error("meter window is empty")]
    EmptyWindow,
    /// `global_avg` was requested while the cumulative count is zero.
    #[error("global average is undefined: no observations recorded")]
    NoObservations,
    /// Lookup of a meter name that was never created.
    #[error("no meter named '{0}'")]
    UnknownMeter(String),
    /// A tensor-like value did not hold exactly one element.
    #[error("expected a scalar value, got a tensor with {elements} elements")]
    NotScalar { elements: usize },
    /// The display template could not be parsed.
    #[error("invalid format template '{template}': {reason}")]
    InvalidFormat { template: String, reason: String },
    /// A meter was configured with a zero-length window.
    #[error("window size must be positive")]
    InvalidWindow,
    /// Shape or argument mismatch in a metric computation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Collective communication failed while synchronising meters.
    #[error(transparent)]
    Dist(#[from] DistError),
}

/// Errors raised by launch-environment parsing and collective operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DistError {
    /// An environment variable was present but not a valid number.
    #[error("environment variable {var}={value:?} is not a valid integer")]
    InvalidEnv { var: String, value: String },
    /// World size of zero.
    #[error("world size must be positive, got {0}")]
    EmptyWorldSize(usize),
    #[error("rank {rank} is out of bounds for world size {world_size}")]
    RankOutOfBounds { rank: usize, world_size: usize },
    /// The collective and the launch information disagree.
    #[error("world size mismatch: expected {expected}, got {got}")]
    WorldSizeMismatch { expected: usize, got: usize },
    #[error("rank mismatch: launch reports {expected}, collective reports {got}")]
    RankMismatch { expected: usize, got: usize },
    /// Ranks contributed buffers of different length to one all-reduce.
    #[error("buffer length mismatch: expected {expected}, got {got}")]
    BufferLengthMismatch { expected: usize, got: usize },
    /// A peer left the group while others were waiting on it.
    #[error("rank {rank} left the group")]
    Disconnected { rank: usize },
}

pub type Result<T, E = MetricError> = std::result::Result<T, E>;
