//! Worker launch information read from the process environment.
//!
//! Two launcher conventions are recognised:
//!
//! - `RANK`, `WORLD_SIZE` and `LOCAL_RANK` (elastic launchers).
//! - `SLURM_PROCID`, with `SLURM_NTASKS` and `SLURM_LOCALID` when present.
//!
//! The first convention wins when both are set. When neither is set the
//! process runs as a single worker.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::DistError;

/// Which launcher convention produced a [`LaunchInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Launcher {
    /// `RANK` / `WORLD_SIZE` / `LOCAL_RANK`.
    Env,
    /// `SLURM_PROCID` / `SLURM_NTASKS` / `SLURM_LOCALID`.
    Slurm,
}

/// Rank and world layout of this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchInfo {
    /// Global rank of this worker.
    pub rank: usize,
    /// Number of workers.
    pub world_size: usize,
    /// Device index of this worker on its node.
    pub local_rank: usize,
    /// Rendezvous address handed to the transport.
    pub init_method: String,
    pub launcher: Launcher,
}

impl LaunchInfo {
    /// Create launch information for an explicit layout.
    pub fn new(rank: usize, world_size: usize) -> Result<Self, DistError> {
        validate(rank, world_size)?;
        Ok(Self {
            rank,
            world_size,
            local_rank: rank,
            init_method: "env://".to_string(),
            launcher: Launcher::Env,
        })
    }

    /// Set the local device index.
    pub fn with_local_rank(mut self, local_rank: usize) -> Self {
        self.local_rank = local_rank;
        self
    }

    /// Set the rendezvous address.
    pub fn with_init_method(mut self, init_method: impl Into<String>) -> Self {
        self.init_method = init_method.into();
        self
    }

    /// Read launch information from the process environment.
    pub fn from_env() -> Result<Option<Self>, DistError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Read launch information through an arbitrary variable lookup.
    ///
    /// Returns `Ok(None)` when no launcher variables are present.
    pub fn from_vars<F>(lookup: F) -> Result<Option<Self>, DistError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| -> Result<Option<usize>, DistError> {
            match lookup(name) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| DistError::InvalidEnv {
                        var: name.to_string(),
                        value: raw,
                    }),
            }
        };

        let (rank, world_size, local_rank, launcher) =
            match (read("RANK")?, read("WORLD_SIZE")?) {
                (Some(rank), Some(world_size)) => {
                    let local_rank = read("LOCAL_RANK")?.unwrap_or(0);
                    (rank, world_size, local_rank, Launcher::Env)
                }
                _ => match read("SLURM_PROCID")? {
                    Some(rank) => {
                        let world_size = read("SLURM_NTASKS")?.unwrap_or(1);
                        let local_rank = read("SLURM_LOCALID")?.unwrap_or(rank);
                        (rank, world_size, local_rank, Launcher::Slurm)
                    }
                    None => return Ok(None),
                },
            };

        validate(rank, world_size)?;
        Ok(Some(Self {
            rank,
            world_size,
            local_rank,
            init_method: lookup("DIST_URL").unwrap_or_else(|| "env://".to_string()),
            launcher,
        }))
    }
}

fn validate(rank: usize, world_size: usize) -> Result<(), DistError> {
    if world_size == 0 {
        return Err(DistError::EmptyWorldSize(world_size));
    }
    if rank >= world_size {
        return Err(DistError::RankOutOfBounds { rank, world_size });
    }
    Ok(())
}
