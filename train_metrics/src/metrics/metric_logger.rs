//! Named collection of [`SmoothedValue`] meters for one logging session.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::log_every::LogEvery;
use super::scalar::IntoScalar;
use super::sink::{MemoryProbe, ProgressSink, StdoutSink};
use super::smoothed_value::{MeterSummary, SmoothedValue, DEFAULT_WINDOW_SIZE};
use crate::dist::DistContext;
use crate::error::MetricError;

/// Settings for a [`MetricLogger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricLoggerConfig {
    /// Separator between metrics and between progress-line fields.
    pub delimiter: String,
    /// Window size for meters created on first update.
    pub window_size: usize,
    /// Iterations between progress lines.
    pub print_freq: usize,
}

impl Default for MetricLoggerConfig {
    fn default() -> Self {
        Self {
            delimiter: "\t".to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            print_freq: 10,
        }
    }
}

impl MetricLoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_print_freq(mut self, print_freq: usize) -> Self {
        self.print_freq = print_freq;
        self
    }
}

/// Insertion-ordered map from metric name to meter.
///
/// Meters are created on first [`update`](Self::update) and only replaced
/// through [`add_meter`](Self::add_meter).
pub struct MetricLogger {
    meters: Vec<(String, SmoothedValue)>,
    delimiter: String,
    window_size: usize,
    print_freq: usize,
    sink: Box<dyn ProgressSink>,
    memory_probe: Option<Box<dyn MemoryProbe>>,
}

impl MetricLogger {
    /// Logger with tab delimiter, printing to stdout.
    pub fn new() -> Self {
        let config = MetricLoggerConfig::default();
        Self {
            meters: Vec::new(),
            delimiter: config.delimiter,
            window_size: config.window_size,
            print_freq: config.print_freq,
            sink: Box::new(StdoutSink::default()),
            memory_probe: None,
        }
    }

    pub fn from_config(config: &MetricLoggerConfig) -> Result<Self, MetricError> {
        if config.window_size == 0 {
            return Err(MetricError::InvalidWindow);
        }
        Ok(Self {
            delimiter: config.delimiter.clone(),
            window_size: config.window_size,
            print_freq: config.print_freq.max(1),
            ..Self::new()
        })
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Send progress lines to `sink` instead of stdout.
    pub fn with_sink<S: ProgressSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Report peak accelerator memory in progress lines.
    pub fn with_memory_probe<P: MemoryProbe + 'static>(mut self, probe: P) -> Self {
        self.memory_probe = Some(Box::new(probe));
        self
    }

    /// Record one observation per named value, each with weight 1.
    ///
    /// Every value is converted before any meter is touched, so a failed
    /// conversion leaves the logger unchanged.
    ///
    /// # Example
    /// ```
    /// use train_metrics::MetricLogger;
    ///
    /// let mut logger = MetricLogger::new();
    /// logger.update([("loss", 0.5), ("acc", 90.0)]).unwrap();
    /// assert_eq!(logger.meter("loss").unwrap().value().unwrap(), 0.5);
    /// ```
    pub fn update<I, K, V>(&mut self, values: I) -> Result<(), MetricError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoScalar,
    {
        let converted = values
            .into_iter()
            .map(|(name, value)| value.into_f64().map(|v| (name, v)))
            .collect::<Result<Vec<_>, _>>()?;

        for (name, value) in converted {
            self.meter_or_insert(name.as_ref()).record(value);
        }
        Ok(())
    }

    /// Record a single named value with weight 1.
    pub fn update_one<V: IntoScalar>(&mut self, name: &str, value: V) -> Result<(), MetricError> {
        let value = value.into_f64()?;
        self.meter_or_insert(name).record(value);
        Ok(())
    }

    fn meter_or_insert(&mut self, name: &str) -> &mut SmoothedValue {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                let meter = SmoothedValue::with_window(self.window_size).unwrap_or_default();
                self.meters.push((name.to_string(), meter));
                self.meters.len() - 1
            }
        };
        &mut self.meters[index].1
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.meters.iter().position(|(n, _)| n == name)
    }

    /// Look up a meter by name.
    pub fn meter(&self, name: &str) -> Result<&SmoothedValue, MetricError> {
        self.position(name)
            .map(|index| &self.meters[index].1)
            .ok_or_else(|| MetricError::UnknownMeter(name.to_string()))
    }

    pub fn meter_mut(&mut self, name: &str) -> Result<&mut SmoothedValue, MetricError> {
        match self.position(name) {
            Some(index) => Ok(&mut self.meters[index].1),
            None => Err(MetricError::UnknownMeter(name.to_string())),
        }
    }

    /// Insert `meter` under `name`, replacing any existing meter in place.
    pub fn add_meter(&mut self, name: impl Into<String>, meter: SmoothedValue) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.meters[index].1 = meter,
            None => self.meters.push((name, meter)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Meter names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.meters.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, meter)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SmoothedValue)> + '_ {
        self.meters.iter().map(|(name, meter)| (name.as_str(), meter))
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn print_freq(&self) -> usize {
        self.print_freq
    }

    /// Synchronise every meter's cumulative statistics, in insertion order.
    pub fn synchronize_across_workers(&mut self, ctx: &DistContext) -> Result<(), MetricError> {
        for (_, meter) in &mut self.meters {
            meter.synchronize_across_workers(ctx)?;
        }
        Ok(())
    }

    /// `"name: formatted"` for each meter, joined by the delimiter.
    ///
    /// Fails if any meter's template references an undefined statistic.
    pub fn format(&self) -> Result<String, MetricError> {
        let parts = self
            .meters
            .iter()
            .map(|(name, meter)| meter.format().map(|text| format!("{name}: {text}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(&self.delimiter))
    }

    /// Summary of every meter, in insertion order.
    pub fn summaries(&self) -> Vec<(String, MeterSummary)> {
        self.meters
            .iter()
            .map(|(name, meter)| (name.clone(), meter.snapshot()))
            .collect()
    }

    /// Wrap `iterable` so that progress is reported every `print_freq`
    /// iterations through this logger's sink.
    ///
    /// The returned adapter borrows the logger; use
    /// [`LogEvery::logger`] to record metrics while iterating.
    ///
    /// ```
    /// use train_metrics::{MemorySink, MetricLogger};
    ///
    /// let sink = MemorySink::new();
    /// let mut logger = MetricLogger::new().with_sink(sink.clone());
    /// let mut progress = logger.log_every(vec![0.9, 0.7, 0.4], 1, "Epoch: [0]");
    /// while let Some(loss) = progress.next() {
    ///     progress.logger().update_one("loss", loss).unwrap();
    /// }
    /// assert_eq!(sink.lines().len(), 4);
    /// ```
    pub fn log_every<I>(
        &mut self,
        iterable: I,
        print_freq: usize,
        header: &str,
    ) -> LogEvery<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
    {
        LogEvery::new(self, iterable.into_iter(), print_freq, header)
    }

    /// [`log_every`](Self::log_every) at the configured print frequency.
    pub fn log_progress<I>(&mut self, iterable: I, header: &str) -> LogEvery<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
    {
        let print_freq = self.print_freq;
        LogEvery::new(self, iterable.into_iter(), print_freq, header)
    }

    pub(crate) fn emit(&mut self, line: &str) {
        self.sink.emit(line);
    }

    pub(crate) fn flush(&mut self) {
        self.sink.flush();
    }

    /// Peak accelerator memory in MiB, when a probe reports one.
    pub(crate) fn peak_memory_mb(&self) -> Option<f64> {
        const MB: f64 = 1024.0 * 1024.0;
        self.memory_probe
            .as_ref()
            .and_then(|probe| probe.peak_bytes())
            .map(|bytes| bytes as f64 / MB)
    }
}

impl Default for MetricLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MetricLogger {
    /// Like [`MetricLogger::format`], with `-` for meters that cannot render yet.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, meter)) in self.meters.iter().enumerate() {
            if i > 0 {
                f.write_str(&self.delimiter)?;
            }
            write!(f, "{name}: {meter}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for MetricLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricLogger")
            .field("meters", &self.meters)
            .field("delimiter", &self.delimiter)
            .field("window_size", &self.window_size)
            .field("print_freq", &self.print_freq)
            .field("memory_probe", &self.memory_probe.is_some())
            .finish()
    }
}
