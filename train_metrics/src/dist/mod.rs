//! Distributed bookkeeping.
//!
//! - [`LaunchInfo`]: rank and world size read from launcher variables
//! - [`Collective`]: barrier and all-reduce over a worker group
//! - [`LocalGroup`]: in-process group for thread-based workers
//! - [`DistContext`]: the handle passed to synchronisation and rank-gated code

pub mod collective;
pub mod context;
pub mod launch;
pub mod local_group;

#[cfg(test)]
mod tests;

pub use collective::Collective;
pub use context::DistContext;
pub use launch::{LaunchInfo, Launcher};
pub use local_group::{LocalGroup, LocalWorker};
