//! Synthetic training epoch on a single worker.
//!
//! Each step draws a noisy regression batch, computes an MSE loss tensor on
//! the NdArray backend and scores a random classifier, then records loss,
//! learning rate and top-k accuracy.

use burn::backend::NdArray;
use burn::tensor::{Tensor, TensorData};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use train_metrics::{
    topk_accuracy, DistContext, LaunchInfo, MetricError, MetricLogger, SmoothedValue,
};

type B = NdArray<f32>;

const STEPS: usize = 50;
const BATCH: usize = 32;
const NUM_CLASSES: usize = 10;

pub fn run() -> Result<(), MetricError> {
    println!("=== Single-worker epoch ===");
    println!();

    let launch = LaunchInfo::from_env()?;
    let ctx = DistContext::from_launch(launch.as_ref(), None)?;

    let device = Default::default();
    let mut rng = StdRng::seed_from_u64(0);

    let mut logger = MetricLogger::new()
        .with_delimiter("  ")
        .with_sink(ctx.stdout_sink());
    logger.add_meter("lr", SmoothedValue::with_format(1, "{value:.6f}")?);
    // weighted by batch size
    logger.add_meter("acc1", SmoothedValue::new());
    logger.add_meter("acc5", SmoothedValue::new());

    let mut progress = logger.log_every(0..STEPS, 10, "Epoch: [0]");
    while let Some(step) = progress.next() {
        let noise = 1.0 - step as f32 / STEPS as f32;
        let targets: Vec<f32> = (0..BATCH).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let preds: Vec<f32> = targets
            .iter()
            .map(|t| t + noise * rng.gen_range(-1.0..1.0))
            .collect();

        let targets = Tensor::<B, 1>::from_data(TensorData::new(targets, [BATCH]), &device);
        let preds = Tensor::<B, 1>::from_data(TensorData::new(preds, [BATCH]), &device);
        let loss = (preds - targets).powf_scalar(2.0).mean();

        let scores: Vec<f32> = (0..BATCH * NUM_CLASSES).map(|_| rng.gen()).collect();
        let labels: Vec<usize> = (0..BATCH).map(|_| rng.gen_range(0..NUM_CLASSES)).collect();
        let acc = topk_accuracy(&scores, NUM_CLASSES, &labels, &[1, 5])?;

        let lr = 0.1 * (1.0 - step as f64 / STEPS as f64);
        let logger = progress.logger();
        logger.update_one("loss", loss)?;
        logger.update_one("lr", lr)?;
        logger.meter_mut("acc1")?.update(acc[0], BATCH as f64);
        logger.meter_mut("acc5")?.update(acc[1], BATCH as f64);
    }

    logger.synchronize_across_workers(&ctx)?;
    println!();
    println!("Averaged stats: {logger}");
    Ok(())
}
