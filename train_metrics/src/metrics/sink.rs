//! Output targets for progress lines and accelerator memory probes.

use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for progress lines emitted by [`MetricLogger`](super::MetricLogger).
pub trait ProgressSink: Send {
    /// Emit a line, subject to the sink's own filtering.
    fn emit(&mut self, line: &str);

    /// Emit a line regardless of filtering.
    fn emit_forced(&mut self, line: &str) {
        self.emit(line);
    }

    /// Flush any buffered output.
    fn flush(&mut self) {}
}

/// Prints lines to stdout when enabled.
///
/// Non-main workers construct this with `enabled = false` so only one
/// process reports progress; [`ProgressSink::emit_forced`] still prints.
#[derive(Debug, Clone, Copy)]
pub struct StdoutSink {
    enabled: bool,
}

impl StdoutSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgressSink for StdoutSink {
    fn emit(&mut self, line: &str) {
        if self.enabled {
            println!("{line}");
        }
    }

    fn emit_forced(&mut self, line: &str) {
        println!("{line}");
    }

    fn flush(&mut self) {
        // stdout is line-buffered and println! ends every line
    }
}

/// Collects lines in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ProgressSink for MemorySink {
    fn emit(&mut self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

/// Reports peak accelerator memory.
///
/// A probe that returns `None` means no accelerator is present, and the
/// memory column is left out of progress lines.
pub trait MemoryProbe: Send {
    /// Peak allocated device memory in bytes.
    fn peak_bytes(&self) -> Option<u64>;
}

impl<F> MemoryProbe for F
where
    F: Fn() -> Option<u64> + Send,
{
    fn peak_bytes(&self) -> Option<u64> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_shares_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.emit("first");
        writer.emit_forced("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);

        sink.clear();
        assert!(writer.lines().is_empty());
    }

    #[test]
    fn test_stdout_sink_enabled_flag() {
        assert!(StdoutSink::default().enabled());
        let mut muted = StdoutSink::new(false);
        assert!(!muted.enabled());
        muted.emit("not printed");
        muted.flush();
    }

    #[test]
    fn test_closure_memory_probe() {
        let probe = || Some(3 * 1024 * 1024u64);
        assert_eq!(probe.peak_bytes(), Some(3 * 1024 * 1024));
        let none = || -> Option<u64> { None };
        assert_eq!(MemoryProbe::peak_bytes(&none), None);
    }
}
