//! Thread workers sharing a [`LocalGroup`].
//!
//! Every worker logs its own shard; only rank 0 prints progress. After the
//! epoch the cumulative statistics are summed across workers and rank 0
//! prints the global averages.

use std::sync::Arc;
use std::thread;

use burn::backend::NdArray;
use burn::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use train_metrics::{
    Collective, DistContext, IntoScalar, LaunchInfo, LocalGroup, MetricError, MetricLogger,
    MetricLoggerConfig,
};

type B = NdArray<f32>;

const WORLD_SIZE: usize = 4;
const STEPS_PER_WORKER: usize = 40;

pub fn run() -> Result<(), MetricError> {
    println!("=== Multi-worker epoch ({WORLD_SIZE} workers) ===");
    println!();

    let handles: Vec<_> = LocalGroup::new(WORLD_SIZE)?
        .into_iter()
        .map(|worker| {
            thread::spawn(move || -> Result<(), MetricError> {
                let launch = LaunchInfo::new(worker.rank(), WORLD_SIZE)?
                    .with_init_method("local://");
                let ctx = DistContext::from_launch(Some(&launch), Some(Arc::new(worker)))?;
                run_worker(&ctx)
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => eprintln!("worker thread panicked"),
        }
    }
    Ok(())
}

fn run_worker(ctx: &DistContext) -> Result<(), MetricError> {
    let device = Default::default();
    let mut rng = StdRng::seed_from_u64(ctx.rank() as u64);

    let config = MetricLoggerConfig::new().with_print_freq(10);
    let mut logger = MetricLogger::from_config(&config)?.with_sink(ctx.stdout_sink());
    let header = format!("Train (rank {}):", ctx.rank());

    let mut progress = logger.log_progress(0..STEPS_PER_WORKER, &header);
    while progress.next().is_some() {
        // each rank sees a slightly different loss level
        let level = 0.5 + 0.1 * ctx.rank() as f32;
        let loss = Tensor::<B, 1>::from_floats([level + rng.gen_range(-0.05..0.05)], &device);
        let correct: f64 = rng.gen_range(0.0..100.0);
        let loss = loss.into_f64()?;
        progress.logger().update([("loss", loss), ("acc", correct)])?;
    }

    logger.synchronize_across_workers(ctx)?;
    ctx.run_on_main(|| {
        println!();
        for (name, summary) in logger.summaries() {
            if let Some(avg) = summary.global_avg {
                println!("{name}: global avg {avg:.4} over {} samples", summary.count);
            }
        }
    });
    Ok(())
}
