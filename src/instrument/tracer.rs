use crate::instrument::recorder::Recorder;
use crate::instrument::types::{DropEvent, WindowSample};
use crate::link::{DropNotice, DropReason, Link};
use crate::metrics;
use crate::sim::Scheduler;
use crate::transport::Endpoint;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Observes congestion-window changes of one endpoint.
///
/// Purely passive: it reads the clock and writes to its recorder, nothing else.
pub struct WindowTracer {
    source: String,
    scheduler: Scheduler,
    recorder: Arc<dyn Recorder>,
    samples: AtomicU64,
}

impl WindowTracer {
    pub fn new(
        source: impl Into<String>,
        scheduler: Scheduler,
        recorder: Arc<dyn Recorder>,
    ) -> Arc<Self> {
        Arc::new(Self {
            source: source.into(),
            scheduler,
            recorder,
            samples: AtomicU64::new(0),
        })
    }

    /// Subscribe this tracer to `endpoint`'s window notifications.
    pub fn attach(self: &Arc<Self>, endpoint: &dyn Endpoint) {
        let tracer = Arc::clone(self);
        endpoint.subscribe_window_change(Box::new(move |old, new| {
            tracer.on_window_change(old, new)
        }));
    }

    pub fn on_window_change(&self, old_window: u32, new_window: u32) {
        let sample = WindowSample {
            time: self.scheduler.now(),
            source: self.source.clone(),
            old_window,
            window: new_window,
        };
        self.samples.fetch_add(1, Ordering::Relaxed);
        metrics::record_window(&self.source, new_window);
        self.recorder.record_window(&sample);
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sample_count(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }
}

/// Observes packets discarded by the receiving end of one link.
pub struct DropTracer {
    source: String,
    scheduler: Scheduler,
    recorder: Arc<dyn Recorder>,
    drops: AtomicU64,
}

impl DropTracer {
    pub fn new(
        source: impl Into<String>,
        scheduler: Scheduler,
        recorder: Arc<dyn Recorder>,
    ) -> Arc<Self> {
        Arc::new(Self {
            source: source.into(),
            scheduler,
            recorder,
            drops: AtomicU64::new(0),
        })
    }

    pub fn attach(self: &Arc<Self>, link: &Link) {
        let tracer = Arc::clone(self);
        link.subscribe_drop(Box::new(move |notice: &DropNotice| {
            tracer.on_link_drop(notice.reason)
        }));
    }

    pub fn on_link_drop(&self, reason: DropReason) {
        let event = DropEvent {
            time: self.scheduler.now(),
            source: self.source.clone(),
            reason,
        };
        self.drops.fetch_add(1, Ordering::Relaxed);
        metrics::record_drop(&self.source, reason);
        self.recorder.record_drop(&event);
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn drop_count(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }
}
