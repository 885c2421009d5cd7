//! Progress-reporting iterator adapter.
//!
//! [`LogEvery`] yields the wrapped items unchanged and measures two
//! intervals per item:
//!
//! - *data time*: from the end of the previous iteration until the inner
//!   iterator produced the item,
//! - *iteration time*: from the end of the previous iteration until the
//!   consumer asks for the next item, i.e. loading plus processing.
//!
//! Every `print_freq`-th iteration (always including the first) a line is
//! written to the logger's sink; after exhaustion one total-time line is
//! written. The adapter is single pass: its timers are never reset.

use std::time::Instant;

use super::metric_logger::MetricLogger;
use super::smoothed_value::SmoothedValue;
use super::template::{Stat, Template};

/// Iterator adapter returned by [`MetricLogger::log_every`].
pub struct LogEvery<'a, I: Iterator> {
    logger: &'a mut MetricLogger,
    inner: I,
    header: String,
    print_freq: usize,
    total: usize,
    width: usize,
    index: usize,
    /// An item was handed out and its iteration time is not yet recorded.
    pending: bool,
    started: bool,
    finished: bool,
    /// Set on the first pull.
    start: Instant,
    end: Instant,
    iter_time: SmoothedValue,
    data_time: SmoothedValue,
}

impl<'a, I: ExactSizeIterator> LogEvery<'a, I> {
    pub(crate) fn new(logger: &'a mut MetricLogger, inner: I, print_freq: usize, header: &str) -> Self {
        let total = inner.len();
        let timer = || SmoothedValue::new().with_template(Template::single(Stat::Avg, Some(4)));
        let now = Instant::now();
        Self {
            logger,
            inner,
            header: header.to_string(),
            print_freq: print_freq.max(1),
            total,
            width: total.to_string().len(),
            index: 0,
            pending: false,
            started: false,
            finished: false,
            start: now,
            end: now,
            iter_time: timer(),
            data_time: timer(),
        }
    }
}

impl<'a, I: Iterator> LogEvery<'a, I> {
    /// The logger being reported, for recording metrics mid-iteration.
    pub fn logger(&mut self) -> &mut MetricLogger {
        &mut *self.logger
    }

    /// Index of the most recently yielded item.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of items the wrapped iterator reported at construction.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Per-iteration wall-clock time in seconds.
    pub fn iter_time(&self) -> &SmoothedValue {
        &self.iter_time
    }

    /// Per-iteration data wait time in seconds.
    pub fn data_time(&self) -> &SmoothedValue {
        &self.data_time
    }

    fn report(&mut self) {
        let remaining = self.total.saturating_sub(self.index);
        let eta_seconds = self.iter_time.global_avg().unwrap_or(0.0) * remaining as f64;

        let mut fields = vec![
            self.header.clone(),
            format!("[{:>width$}/{}]", self.index, self.total, width = self.width),
            format!("eta: {}", format_hms(eta_seconds)),
            self.logger.to_string(),
            format!("time: {}", self.iter_time),
            format!("data: {}", self.data_time),
        ];
        if let Some(mb) = self.logger.peak_memory_mb() {
            fields.push(format!("max mem: {mb:.0}"));
        }

        let line = fields.join(self.logger.delimiter());
        self.logger.emit(&line);
    }

    fn report_total(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        let line = format!("{} Total time: {}", self.header, format_hms(elapsed));
        self.logger.emit(&line);
        self.logger.flush();
    }
}

impl<'a, I: Iterator> Iterator for LogEvery<'a, I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.started {
            let now = Instant::now();
            self.start = now;
            self.end = now;
            self.started = true;
        }

        if self.pending {
            self.iter_time.record(self.end.elapsed().as_secs_f64());
            if self.index % self.print_freq == 0 {
                self.report();
            }
            self.index += 1;
            self.pending = false;
            self.end = Instant::now();
        }

        match self.inner.next() {
            Some(item) => {
                self.data_time.record(self.end.elapsed().as_secs_f64());
                self.pending = true;
                Some(item)
            }
            None => {
                self.finished = true;
                self.report_total();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            self.inner.size_hint()
        }
    }
}

impl<'a, I: ExactSizeIterator> ExactSizeIterator for LogEvery<'a, I> {}

/// Render whole seconds as `H:MM:SS`, prefixed by `N day(s), ` past a day.
///
/// Fractional seconds are truncated; negative or non-finite input renders
/// as zero.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;

    match days {
        0 => format!("{hours}:{minutes:02}:{secs:02}"),
        1 => format!("1 day, {hours}:{minutes:02}:{secs:02}"),
        n => format!("{n} days, {hours}:{minutes:02}:{secs:02}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::metrics::sink::MemorySink;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0), "0:00:00");
        assert_eq!(format_hms(59.9), "0:00:59");
        assert_eq!(format_hms(3_723.0), "1:02:03");
        assert_eq!(format_hms(86_400.0 + 5.0), "1 day, 0:00:05");
        assert_eq!(format_hms(3.0 * 86_400.0 + 36_000.0), "3 days, 10:00:00");
        assert_eq!(format_hms(-4.0), "0:00:00");
        assert_eq!(format_hms(f64::NAN), "0:00:00");
    }

    #[test]
    fn test_yields_items_unchanged_and_in_order() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new().with_sink(sink.clone());
        let items: Vec<_> = logger
            .log_every(vec!["a", "b", "c", "d", "e"], 2, "")
            .collect();
        assert_eq!(items, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_report_cadence() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new().with_sink(sink.clone());
        let mut progress = logger.log_every(0..5, 2, "Test:");
        while let Some(i) = progress.next() {
            progress.logger().update_one("step", i).unwrap();
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Test:\t[0/5]\teta: "));
        assert!(lines[1].starts_with("Test:\t[2/5]\t"));
        assert!(lines[2].starts_with("Test:\t[4/5]\t"));
        assert!(lines[3].starts_with("Test: Total time: "));
    }

    #[test]
    fn test_line_fields() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new().with_sink(sink.clone()).with_delimiter("  ");
        let mut progress = logger.log_every(vec![0.5; 12], 100, "Epoch: [3]");
        while let Some(loss) = progress.next() {
            progress.logger().update_one("loss", loss).unwrap();
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        let fields: Vec<&str> = lines[0].split("  ").collect();
        assert_eq!(fields[0], "Epoch: [3]");
        // Index is right-aligned to the width of the total.
        assert_eq!(fields[1], "[ 0/12]");
        assert!(fields[2].starts_with("eta: 0:00:"));
        assert_eq!(fields[3], "loss: 0.5000 (0.5000)");
        assert!(fields[4].starts_with("time: "));
        assert!(fields[5].starts_with("data: "));
        assert_eq!(fields.len(), 6, "no memory column without a probe");
    }

    #[test]
    fn test_memory_column_with_probe() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new()
            .with_sink(sink.clone())
            .with_memory_probe(|| Some(512 * 1024 * 1024u64));
        logger.log_every(vec![(); 1], 1, "").for_each(drop);

        let lines = sink.lines();
        assert!(lines[0].ends_with("\tmax mem: 512"), "{}", lines[0]);
    }

    #[test]
    fn test_probe_without_accelerator_omits_column() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new()
            .with_sink(sink.clone())
            .with_memory_probe(|| -> Option<u64> { None });
        logger.log_every(vec![(); 1], 1, "").for_each(drop);
        assert!(!sink.lines()[0].contains("max mem"));
    }

    #[test]
    fn test_empty_source_prints_only_total() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new().with_sink(sink.clone());
        let mut progress = logger.log_every(Vec::<u8>::new(), 1, "Empty");
        assert_eq!(progress.next(), None);
        assert_eq!(progress.next(), None);
        assert_eq!(sink.lines(), vec!["Empty Total time: 0:00:00".to_string()]);
    }

    #[test]
    fn test_zero_print_freq_reports_every_iteration() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new().with_sink(sink.clone());
        logger.log_every(0..3, 0, "").for_each(drop);
        assert_eq!(sink.lines().len(), 4);
    }

    #[test]
    fn test_clocks_start_on_first_pull() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new().with_sink(sink.clone());
        let mut progress = logger.log_every(0..1, 1, "Idle");
        std::thread::sleep(Duration::from_millis(200));

        assert_eq!(progress.next(), Some(0));
        assert!(progress.data_time().value().unwrap() < 0.1);
        assert_eq!(progress.next(), None);
        assert!(progress.iter_time().value().unwrap() < 0.1);
        assert_eq!(sink.lines().last().unwrap(), "Idle Total time: 0:00:00");
    }

    #[test]
    fn test_timers_and_size_hint() {
        let sink = MemorySink::new();
        let mut logger = MetricLogger::new().with_sink(sink);
        let mut progress = logger.log_every(0..4, 10, "");
        assert_eq!(progress.len(), 4);
        progress.next();
        assert_eq!(progress.len(), 3);
        assert_eq!(progress.data_time().count(), 1.0);
        assert_eq!(progress.iter_time().count(), 0.0);
        progress.next();
        assert_eq!(progress.iter_time().count(), 1.0);
        assert_eq!(progress.index(), 1);
        assert_eq!(progress.total(), 4);
    }
}
