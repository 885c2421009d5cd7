//! Collective-communication abstraction used for cross-worker aggregation.

use crate::error::DistError;

/// Blocking collective operations over a fixed group of workers.
///
/// Every worker must issue the same sequence of collective calls. A worker
/// that skips or reorders a call leaves its peers blocked; implementations
/// are not required to detect this.
pub trait Collective: Send + Sync {
    /// Rank of this worker within the group.
    fn rank(&self) -> usize;

    /// Number of workers in the group.
    fn world_size(&self) -> usize;

    /// Block until every worker in the group has reached this call.
    fn barrier(&self) -> Result<(), DistError>;

    /// Element-wise sum of `buffer` across all workers.
    ///
    /// On return every worker's `buffer` holds the combined values.
    fn all_reduce_sum(&self, buffer: &mut [f64]) -> Result<(), DistError>;
}
