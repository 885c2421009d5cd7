//! Explicit distributed context passed to rank-aware code.

use std::fmt;
use std::sync::Arc;

use super::collective::Collective;
use super::launch::LaunchInfo;
use crate::error::DistError;
use crate::metrics::sink::StdoutSink;

/// Handle describing whether this process takes part in a worker group.
///
/// A single-worker context carries no collective: rank is 0, world size
/// is 1, and every collective operation returns immediately.
#[derive(Clone, Default)]
pub struct DistContext {
    collective: Option<Arc<dyn Collective>>,
}

impl DistContext {
    /// Context for a process that runs on its own.
    pub fn single() -> Self {
        Self { collective: None }
    }

    /// Context backed by an established collective.
    pub fn new(collective: Arc<dyn Collective>) -> Self {
        Self {
            collective: Some(collective),
        }
    }

    /// Build a context from launch information and an optional collective.
    ///
    /// Launch information without a collective degrades to a single-worker
    /// context. This keeps single-node scripts working under a launcher, but
    /// also hides a missing transport in a real multi-worker job, so it is
    /// logged as a warning.
    pub fn from_launch(
        launch: Option<&LaunchInfo>,
        collective: Option<Arc<dyn Collective>>,
    ) -> Result<Self, DistError> {
        match (launch, collective) {
            (None, None) => {
                log::info!("Not using distributed mode");
                Ok(Self::single())
            }
            (Some(info), None) => {
                log::warn!(
                    "launch reports rank {} of {} but no collective was provided; \
                     running as a single worker",
                    info.rank,
                    info.world_size
                );
                Ok(Self::single())
            }
            (Some(info), Some(collective)) => {
                if collective.world_size() != info.world_size {
                    return Err(DistError::WorldSizeMismatch {
                        expected: info.world_size,
                        got: collective.world_size(),
                    });
                }
                if collective.rank() != info.rank {
                    return Err(DistError::RankMismatch {
                        expected: info.rank,
                        got: collective.rank(),
                    });
                }
                log::info!(
                    "distributed init (rank {}): {}",
                    info.rank,
                    info.init_method
                );
                Ok(Self::new(collective))
            }
            (None, Some(collective)) => Ok(Self::new(collective)),
        }
    }

    /// Whether a collective is attached.
    pub fn is_initialized(&self) -> bool {
        self.collective.is_some()
    }

    /// The attached collective, if any.
    pub fn collective(&self) -> Option<&dyn Collective> {
        self.collective.as_deref()
    }

    pub fn rank(&self) -> usize {
        self.collective.as_ref().map_or(0, |c| c.rank())
    }

    pub fn world_size(&self) -> usize {
        self.collective.as_ref().map_or(1, |c| c.world_size())
    }

    /// Rank 0, or any single-worker process.
    pub fn is_main_process(&self) -> bool {
        self.rank() == 0
    }

    /// Run `f` on the main process only.
    pub fn run_on_main<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        if self.is_main_process() {
            Some(f())
        } else {
            None
        }
    }

    /// Stdout sink that only prints on the main process.
    pub fn stdout_sink(&self) -> StdoutSink {
        StdoutSink::new(self.is_main_process())
    }

    /// Barrier across the group; no-op for a single worker.
    pub fn barrier(&self) -> Result<(), DistError> {
        match self.collective() {
            Some(collective) => collective.barrier(),
            None => Ok(()),
        }
    }

    /// Sum `buffer` across the group; no-op for a single worker.
    pub fn all_reduce_sum(&self, buffer: &mut [f64]) -> Result<(), DistError> {
        match self.collective() {
            Some(collective) => collective.all_reduce_sum(buffer),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for DistContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistContext")
            .field("initialized", &self.is_initialized())
            .field("rank", &self.rank())
            .field("world_size", &self.world_size())
            .finish()
    }
}
