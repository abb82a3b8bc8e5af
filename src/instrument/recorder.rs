use crate::instrument::types::{DropEvent, WindowSample};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Destination for instrumentation samples.
///
/// Recorders are called inline on the scheduler's callback path and must not
/// fail outward: any I/O trouble is absorbed by the recorder itself.
pub trait Recorder: Send + Sync {
    fn record_window(&self, sample: &WindowSample);

    fn record_drop(&self, event: &DropEvent);
}

/// Keeps every sample in memory.
#[derive(Default)]
pub struct MemoryRecorder {
    windows: Mutex<Vec<WindowSample>>,
    drops: Mutex<Vec<DropEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn windows(&self) -> Vec<WindowSample> {
        self.windows.lock().clone()
    }

    /// Window samples from one endpoint, in arrival order
    pub fn windows_from(&self, source: &str) -> Vec<WindowSample> {
        self.windows
            .lock()
            .iter()
            .filter(|s| s.source == source)
            .cloned()
            .collect()
    }

    pub fn drops(&self) -> Vec<DropEvent> {
        self.drops.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.lock().is_empty() && self.drops.lock().is_empty()
    }
}

impl Recorder for MemoryRecorder {
    fn record_window(&self, sample: &WindowSample) {
        self.windows.lock().push(sample.clone());
    }

    fn record_drop(&self, event: &DropEvent) {
        self.drops.lock().push(event.clone());
    }
}

/// Writes one trace line per sample to any `Write`.
pub struct LineRecorder<W: Write + Send> {
    writer: Mutex<W>,
    write_errors: AtomicU64,
}

impl<W: Write + Send> LineRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Lines that could not be written
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().flush()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_line(&self, line: &str) {
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{line}") {
            // Only the first failure is logged; a broken pipe would otherwise flood.
            if self.write_errors.fetch_add(1, Ordering::Relaxed) == 0 {
                tracing::warn!(error = %e, "Failed to write trace line");
            }
        }
    }
}

impl<W: Write + Send> Recorder for LineRecorder<W> {
    fn record_window(&self, sample: &WindowSample) {
        self.write_line(&sample.trace_line());
    }

    fn record_drop(&self, event: &DropEvent) {
        self.write_line(&event.trace_line());
    }
}

/// Emits samples as `tracing` events under the `congestion_trace::samples` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

impl Recorder for TracingRecorder {
    fn record_window(&self, sample: &WindowSample) {
        tracing::debug!(
            target: "congestion_trace::samples",
            time = sample.time.as_secs_f64(),
            source = %sample.source,
            old = sample.old_window,
            new = sample.window,
            "Window change"
        );
    }

    fn record_drop(&self, event: &DropEvent) {
        tracing::debug!(
            target: "congestion_trace::samples",
            time = event.time.as_secs_f64(),
            source = %event.source,
            reason = %event.reason,
            "RxDrop"
        );
    }
}

/// Forwards every sample to each inner recorder in order.
#[derive(Default)]
pub struct FanoutRecorder {
    recorders: Vec<Arc<dyn Recorder>>,
}

impl FanoutRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorders.push(recorder);
        self
    }

    pub fn len(&self) -> usize {
        self.recorders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorders.is_empty()
    }
}

impl Recorder for FanoutRecorder {
    fn record_window(&self, sample: &WindowSample) {
        for recorder in &self.recorders {
            recorder.record_window(sample);
        }
    }

    fn record_drop(&self, event: &DropEvent) {
        for recorder in &self.recorders {
            recorder.record_drop(event);
        }
    }
}
