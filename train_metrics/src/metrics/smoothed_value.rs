//! Windowed and cumulative statistics over a stream of scalar observations.
//!
//! A [`SmoothedValue`] keeps the most recent `window_size` observations for
//! smoothed diagnostics (median, mean, max, latest) and an unbounded
//! weighted sum and count for the global average.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::template::{Stat, Template};
use crate::dist::DistContext;
use crate::error::MetricError;

/// Window size used when none is given.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Bounded window of recent values plus running sum and count.
///
/// Serializes as `{window, window_size, count, total, template}`; the
/// template is stored as its source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SmoothedValueRepr", into = "SmoothedValueRepr")]
pub struct SmoothedValue {
    window: VecDeque<f64>,
    window_size: usize,
    count: f64,
    total: f64,
    template: Template,
}

impl SmoothedValue {
    /// Create a meter with the default window and display template.
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(DEFAULT_WINDOW_SIZE),
            window_size: DEFAULT_WINDOW_SIZE,
            count: 0.0,
            total: 0.0,
            template: Template::default(),
        }
    }

    /// Create a meter keeping the last `window_size` values.
    pub fn with_window(window_size: usize) -> Result<Self, MetricError> {
        if window_size == 0 {
            return Err(MetricError::InvalidWindow);
        }
        Ok(Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            ..Self::new()
        })
    }

    /// Create a meter with an explicit window and display template.
    ///
    /// # Example
    /// ```
    /// use train_metrics::SmoothedValue;
    ///
    /// let mut lr = SmoothedValue::with_format(1, "{value:.6f}").unwrap();
    /// lr.record(3e-4);
    /// assert_eq!(lr.format().unwrap(), "0.000300");
    /// ```
    pub fn with_format(window_size: usize, template: &str) -> Result<Self, MetricError> {
        let mut meter = Self::with_window(window_size)?;
        meter.template = Template::parse(template)?;
        Ok(meter)
    }

    /// Replace the display template.
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// Record `value` with weight `weight`.
    ///
    /// The window receives `value` once regardless of weight; `count` grows
    /// by `weight` and `total` by `value * weight`.
    pub fn update(&mut self, value: f64, weight: f64) {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(value);
        self.count += weight;
        self.total += value * weight;
    }

    /// Record `value` with weight 1.
    pub fn record(&mut self, value: f64) {
        self.update(value, 1.0);
    }

    /// Sum `count` and `total` across all workers of `ctx`.
    ///
    /// The window is not synchronised: median, avg, max and value stay
    /// per-worker. Returns immediately for a single-worker context. Every
    /// worker must call this in the same order as its peers.
    pub fn synchronize_across_workers(&mut self, ctx: &DistContext) -> Result<(), MetricError> {
        if !ctx.is_initialized() {
            return Ok(());
        }
        let mut buffer = [self.count, self.total];
        ctx.barrier()?;
        ctx.all_reduce_sum(&mut buffer)?;
        log::debug!(
            "rank {}: synchronised meter count {} -> {}",
            ctx.rank(),
            self.count,
            buffer[0]
        );
        self.count = buffer[0];
        self.total = buffer[1];
        Ok(())
    }

    /// Median of the window. For an even number of values this is the
    /// lower of the two middle values.
    pub fn median(&self) -> Result<f64, MetricError> {
        if self.window.is_empty() {
            return Err(MetricError::EmptyWindow);
        }
        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Ok(sorted[(sorted.len() - 1) / 2])
    }

    /// Arithmetic mean of the window.
    pub fn avg(&self) -> Result<f64, MetricError> {
        if self.window.is_empty() {
            return Err(MetricError::EmptyWindow);
        }
        Ok(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }

    /// `total / count` over every observation ever recorded.
    pub fn global_avg(&self) -> Result<f64, MetricError> {
        if self.count == 0.0 {
            return Err(MetricError::NoObservations);
        }
        Ok(self.total / self.count)
    }

    /// Maximum of the window (not of the full history).
    pub fn max(&self) -> Result<f64, MetricError> {
        self.window
            .iter()
            .copied()
            .reduce(f64::max)
            .ok_or(MetricError::EmptyWindow)
    }

    /// Most recently recorded value.
    pub fn value(&self) -> Result<f64, MetricError> {
        self.window.back().copied().ok_or(MetricError::EmptyWindow)
    }

    /// Resolve a statistic by name.
    pub fn stat(&self, stat: Stat) -> Result<f64, MetricError> {
        match stat {
            Stat::Median => self.median(),
            Stat::Avg => self.avg(),
            Stat::GlobalAvg => self.global_avg(),
            Stat::Max => self.max(),
            Stat::Value => self.value(),
        }
    }

    /// Render the display template.
    pub fn format(&self) -> Result<String, MetricError> {
        self.template.render(|stat| self.stat(stat))
    }

    /// Every currently defined statistic.
    pub fn snapshot(&self) -> MeterSummary {
        MeterSummary {
            count: self.count,
            total: self.total,
            median: self.median().ok(),
            avg: self.avg().ok(),
            global_avg: self.global_avg().ok(),
            max: self.max().ok(),
            value: self.value().ok(),
        }
    }

    /// Values currently in the window, oldest first.
    pub fn window(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Cumulative weight of all observations.
    pub fn count(&self) -> f64 {
        self.count
    }

    /// Cumulative weighted sum of all observations.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SmoothedValue {
    /// Renders the template, or `-` while a referenced statistic is undefined.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("-"),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SmoothedValueRepr {
    window: Vec<f64>,
    window_size: usize,
    count: f64,
    total: f64,
    template: Template,
}

impl From<SmoothedValue> for SmoothedValueRepr {
    fn from(meter: SmoothedValue) -> Self {
        Self {
            window: meter.window.into(),
            window_size: meter.window_size,
            count: meter.count,
            total: meter.total,
            template: meter.template,
        }
    }
}

impl TryFrom<SmoothedValueRepr> for SmoothedValue {
    type Error = MetricError;

    fn try_from(repr: SmoothedValueRepr) -> Result<Self, Self::Error> {
        if repr.window_size == 0 {
            return Err(MetricError::InvalidWindow);
        }
        if repr.window.len() > repr.window_size {
            return Err(MetricError::InvalidInput(format!(
                "window holds {} values but its size is {}",
                repr.window.len(),
                repr.window_size
            )));
        }
        let mut window = VecDeque::with_capacity(repr.window_size);
        window.extend(repr.window);
        Ok(Self {
            window,
            window_size: repr.window_size,
            count: repr.count,
            total: repr.total,
            template: repr.template,
        })
    }
}

/// Serializable view of a meter's statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterSummary {
    pub count: f64,
    pub total: f64,
    pub median: Option<f64>,
    pub avg: Option<f64>,
    pub global_avg: Option<f64>,
    pub max: Option<f64>,
    pub value: Option<f64>,
}
