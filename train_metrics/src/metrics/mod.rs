//! Meters, the metric logger and progress reporting.
//!
//! ## Meters
//!
//! - [`SmoothedValue`]: windowed median/avg/max/value plus a global average
//! - [`Template`]: display template such as `"{median:.4f} ({global_avg:.4f})"`
//!
//! ## Logging
//!
//! - [`MetricLogger`]: named meters in insertion order
//! - [`LogEvery`]: iterator adapter printing progress every N iterations
//! - [`ProgressSink`]: where progress lines go ([`StdoutSink`], [`MemorySink`])

pub mod accuracy;
pub mod log_every;
pub mod metric_logger;
pub mod scalar;
pub mod sink;
pub mod smoothed_value;
pub mod template;


pub use accuracy::topk_accuracy;
pub use log_every::{format_hms, LogEvery};
pub use metric_logger::{MetricLogger, MetricLoggerConfig};
pub use scalar::IntoScalar;
pub use sink::{MemoryProbe, MemorySink, ProgressSink, StdoutSink};
pub use smoothed_value::{MeterSummary, SmoothedValue, DEFAULT_WINDOW_SIZE};
pub use template::{Stat, Template, DEFAULT_TEMPLATE};
