//! In-process collective group for thread-based workers.
//!
//! [`LocalGroup::new`] hands out one [`LocalWorker`] per rank. Each worker
//! is moved into its own thread and implements [`Collective`] through a
//! shared rendezvous: the last rank to arrive publishes the reduced buffer
//! and wakes the others.
//!
//! ```ignore
//! let workers = LocalGroup::new(4)?;
//! let handles: Vec<_> = workers
//!     .into_iter()
//!     .map(|worker| std::thread::spawn(move || {
//!         let mut buf = [worker.rank() as f64];
//!         worker.all_reduce_sum(&mut buf).unwrap();
//!         buf[0]
//!     }))
//!     .collect();
//! ```

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::collective::Collective;
use crate::error::DistError;

#[derive(Debug, Default)]
struct GroupInner {
    /// Ranks that have contributed to the current round.
    arrived: usize,
    /// Round counter, bumped when the first rank of a round arrives.
    generation: u64,
    /// Last round whose result is published.
    ready_generation: u64,
    buffer: Vec<f64>,
    result: Vec<f64>,
    error: Option<DistError>,
    departed: Option<usize>,
}

#[derive(Debug, Default)]
struct GroupState {
    inner: Mutex<GroupInner>,
    condvar: Condvar,
}

/// Factory for a group of in-process workers.
pub struct LocalGroup;

impl LocalGroup {
    /// Create a group of `world_size` workers, ordered by rank.
    pub fn new(world_size: usize) -> Result<Vec<LocalWorker>, DistError> {
        if world_size == 0 {
            return Err(DistError::EmptyWorldSize(world_size));
        }
        let state = Arc::new(GroupState::default());
        Ok((0..world_size)
            .map(|rank| LocalWorker {
                rank,
                world_size,
                state: Arc::clone(&state),
            })
            .collect())
    }
}

/// One rank of a [`LocalGroup`].
///
/// Dropping a worker while peers wait on it fails their pending and future
/// collectives with [`DistError::Disconnected`].
#[derive(Debug)]
pub struct LocalWorker {
    rank: usize,
    world_size: usize,
    state: Arc<GroupState>,
}

impl Collective for LocalWorker {
    fn rank(&self) -> usize {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.world_size
    }

    fn barrier(&self) -> Result<(), DistError> {
        self.all_reduce_sum(&mut [])
    }

    fn all_reduce_sum(&self, buffer: &mut [f64]) -> Result<(), DistError> {
        let group = &self.state;
        let mut state = group.inner.lock();

        if let Some(rank) = state.departed {
            return Err(DistError::Disconnected { rank });
        }

        if state.arrived == 0 {
            state.generation = state.generation.wrapping_add(1);
            state.buffer.clear();
            state.buffer.resize(buffer.len(), 0.0);
            state.error = None;
        } else if state.buffer.len() != buffer.len() {
            let error = DistError::BufferLengthMismatch {
                expected: state.buffer.len(),
                got: buffer.len(),
            };
            state.arrived = 0;
            state.ready_generation = state.generation;
            state.error = Some(error.clone());
            group.condvar.notify_all();
            return Err(error);
        }

        for (dst, value) in state.buffer.iter_mut().zip(buffer.iter()) {
            *dst += *value;
        }
        state.arrived += 1;
        let current_generation = state.generation;

        if state.arrived == self.world_size {
            state.result = std::mem::take(&mut state.buffer);
            state.arrived = 0;
            state.ready_generation = current_generation;
            group.condvar.notify_all();
        } else {
            while state.ready_generation != current_generation {
                group.condvar.wait(&mut state);
            }
            if let Some(error) = state.error.clone() {
                return Err(error);
            }
        }

        buffer.copy_from_slice(&state.result);
        Ok(())
    }
}

impl Drop for LocalWorker {
    fn drop(&mut self) {
        let mut state = self.state.inner.lock();
        if state.departed.is_some() {
            return;
        }
        state.departed = Some(self.rank);
        if state.arrived > 0 {
            state.arrived = 0;
            state.ready_generation = state.generation;
            state.error = Some(DistError::Disconnected { rank: self.rank });
            self.state.condvar.notify_all();
        }
    }
}
