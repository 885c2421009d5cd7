//! Tests for launch parsing, DistContext construction and rank gating.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use super::*;
use crate::error::DistError;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

fn worker_at(world_size: usize, rank: usize) -> Arc<dyn Collective> {
    let mut workers = LocalGroup::new(world_size).unwrap();
    Arc::new(workers.swap_remove(rank))
}

// =============================================================================
// SINGLE-WORKER CONTEXT
// =============================================================================

#[test]
fn test_single_context_defaults() {
    let ctx = DistContext::single();
    assert!(!ctx.is_initialized());
    assert_eq!(ctx.rank(), 0);
    assert_eq!(ctx.world_size(), 1);
    assert!(ctx.is_main_process());
    assert!(ctx.stdout_sink().enabled());

    let mut buf = [1.0, 2.0];
    ctx.barrier().unwrap();
    ctx.all_reduce_sum(&mut buf).unwrap();
    assert_eq!(buf, [1.0, 2.0]);
}

#[test]
fn test_run_on_main_single() {
    let ctx = DistContext::default();
    assert_eq!(ctx.run_on_main(|| 7), Some(7));
}

// =============================================================================
// FROM_LAUNCH
// =============================================================================

#[test]
fn test_from_launch_without_anything_is_single() {
    let ctx = DistContext::from_launch(None, None).unwrap();
    assert!(!ctx.is_initialized());
}

#[test]
fn test_partial_launch_degrades_to_single() {
    let info = LaunchInfo::new(2, 4).unwrap();
    let ctx = DistContext::from_launch(Some(&info), None).unwrap();
    assert!(!ctx.is_initialized());
    assert_eq!(ctx.rank(), 0);
    assert_eq!(ctx.world_size(), 1);
}

#[test]
fn test_from_launch_with_matching_collective() {
    let info = LaunchInfo::new(1, 2)
        .unwrap()
        .with_init_method("tcp://127.0.0.1:23456");
    let ctx = DistContext::from_launch(Some(&info), Some(worker_at(2, 1))).unwrap();
    assert!(ctx.is_initialized());
    assert_eq!(ctx.rank(), 1);
    assert_eq!(ctx.world_size(), 2);
    assert!(!ctx.is_main_process());
}

#[test]
fn test_from_launch_rejects_mismatches() {
    let info = LaunchInfo::new(0, 4).unwrap();
    assert_eq!(
        DistContext::from_launch(Some(&info), Some(worker_at(2, 0))).unwrap_err(),
        DistError::WorldSizeMismatch { expected: 4, got: 2 }
    );

    let info = LaunchInfo::new(0, 2).unwrap();
    assert_eq!(
        DistContext::from_launch(Some(&info), Some(worker_at(2, 1))).unwrap_err(),
        DistError::RankMismatch { expected: 0, got: 1 }
    );
}

#[test]
fn test_from_env_vars_end_to_end() {
    let vars = lookup(&[("SLURM_PROCID", "3"), ("SLURM_NTASKS", "4")]);
    let info = LaunchInfo::from_vars(vars).unwrap().unwrap();
    assert_eq!(info.launcher, Launcher::Slurm);

    let ctx = DistContext::from_launch(Some(&info), Some(worker_at(4, 3))).unwrap();
    assert_eq!(ctx.rank(), 3);
    assert_eq!(ctx.run_on_main(|| ()), None);
}

// =============================================================================
// MULTI-WORKER CONTEXT
// =============================================================================

#[test]
fn test_rank_gating_across_threads() {
    let handles: Vec<_> = LocalGroup::new(3)
        .unwrap()
        .into_iter()
        .map(|worker| {
            thread::spawn(move || {
                let ctx = DistContext::new(Arc::new(worker));
                let mut buf = [1.0];
                ctx.all_reduce_sum(&mut buf).unwrap();
                ctx.barrier().unwrap();
                (
                    ctx.rank(),
                    buf[0],
                    ctx.run_on_main(|| "saved"),
                    ctx.stdout_sink().enabled(),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec![
            (0, 3.0, Some("saved"), true),
            (1, 3.0, None, false),
            (2, 3.0, None, false),
        ]
    );
}

#[test]
fn test_context_clones_share_collective() {
    let ctx = DistContext::new(worker_at(2, 1));
    let clone = ctx.clone();
    assert_eq!(clone.rank(), 1);
    assert!(format!("{clone:?}").contains("world_size: 2"));
}
