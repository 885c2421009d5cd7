//! # train_metrics: smoothed metrics and progress logging for training loops
//!
//! Tracks scalar training metrics (loss, accuracy, learning rate) as
//! windowed and cumulative statistics, prints periodic progress lines with
//! timing and ETA, and aggregates cumulative statistics across workers.
//!
//! ## Overview
//!
//! ```text
//!   training loop ──update──▶ MetricLogger ──▶ SmoothedValue (per metric)
//!        ▲                        │                 │
//!        │ items               log_every        synchronize_across_workers
//!        │                        ▼                 ▼
//!     LogEvery ──progress line──▶ ProgressSink   DistContext ──▶ Collective
//! ```
//!
//! Only `count` and `total` are summed across workers; window statistics
//! always describe the local worker.
//!
//! ## Usage
//!
//! ```rust
//! use train_metrics::{DistContext, MemorySink, MetricLogger};
//!
//! let ctx = DistContext::single();
//! let sink = MemorySink::new();
//! let mut logger = MetricLogger::new().with_sink(sink.clone());
//!
//! let batches = vec![0.9, 0.6, 0.4, 0.3];
//! let mut progress = logger.log_every(batches, 2, "Epoch: [0]");
//! while let Some(loss) = progress.next() {
//!     progress.logger().update([("loss", loss), ("lr", 0.1)]).unwrap();
//! }
//!
//! logger.synchronize_across_workers(&ctx).unwrap();
//! let loss = logger.meter("loss").unwrap();
//! assert!((loss.global_avg().unwrap() - 0.55).abs() < 1e-12);
//! assert_eq!(sink.lines().len(), 3);
//! ```

pub mod dist;
pub mod error;
pub mod metrics;
pub mod util;

pub use dist::{Collective, DistContext, LaunchInfo, Launcher, LocalGroup, LocalWorker};
pub use error::{DistError, MetricError, Result};
pub use metrics::{
    format_hms, topk_accuracy, IntoScalar, LogEvery, MemoryProbe, MemorySink, MeterSummary,
    MetricLogger, MetricLoggerConfig, ProgressSink, SmoothedValue, Stat, StdoutSink, Template,
};
pub use util::ensure_dir;
