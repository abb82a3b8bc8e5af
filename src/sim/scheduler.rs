use crate::sim::error::{SimError, SimResult};
use crate::sim::types::{EventId, SimTime};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

/// A callback run by the scheduler at its virtual time.
pub type Callback = Box<dyn FnOnce(&Scheduler) + Send + 'static>;

struct QueuedEvent {
    time: SimTime,
    id: EventId,
    callback: Callback,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl Eq for QueuedEvent {}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap: earliest time first, then lowest sequence (FIFO)
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

struct SchedulerInner {
    now: SimTime,
    next_sequence: u64,
    queue: BinaryHeap<QueuedEvent>,
    /// Ids that are scheduled and neither fired nor cancelled
    pending: HashSet<EventId>,
    horizon: Option<SimTime>,
    executed: u64,
}

impl SchedulerInner {
    /// Pop the next live event due at or before `limit`.
    ///
    /// Cancelled events met on the way are moved into `discarded`; callers
    /// drop them after releasing the lock, since a callback's captures may
    /// touch the scheduler when dropped.
    fn pop_due(
        &mut self,
        limit: Option<SimTime>,
        discarded: &mut Vec<QueuedEvent>,
    ) -> Option<QueuedEvent> {
        loop {
            let top = self.queue.peek()?;
            if !self.pending.contains(&top.id) {
                discarded.extend(self.queue.pop());
                continue;
            }
            if limit.is_some_and(|limit| top.time > limit) {
                return None;
            }
            let event = self.queue.pop()?;
            self.pending.remove(&event.id);
            self.now = event.time;
            self.executed += 1;
            return Some(event);
        }
    }
}

/// Single-threaded discrete-event scheduler.
///
/// Cloning yields another handle onto the same clock and queue. The internal
/// lock is released before a callback runs, so callbacks may schedule and
/// cancel further events.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                now: SimTime::ZERO,
                next_sequence: 0,
                queue: BinaryHeap::new(),
                pending: HashSet::new(),
                horizon: None,
                executed: 0,
            })),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> SimTime {
        self.inner.lock().now
    }

    /// Schedule `callback` at absolute virtual time `time`.
    pub fn schedule_at<F>(&self, time: SimTime, callback: F) -> SimResult<EventId>
    where
        F: FnOnce(&Scheduler) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if time < inner.now {
            return Err(SimError::InPast {
                requested: time,
                now: inner.now,
            });
        }
        Ok(Self::push(&mut inner, time, Box::new(callback)))
    }

    /// Schedule `callback` at `now + delay`.
    pub fn schedule_in<F>(&self, delay: SimTime, callback: F) -> EventId
    where
        F: FnOnce(&Scheduler) + Send + 'static,
    {
        let mut inner = self.inner.lock();
        let time = inner.now.saturating_add(delay);
        Self::push(&mut inner, time, Box::new(callback))
    }

    fn push(inner: &mut SchedulerInner, time: SimTime, callback: Callback) -> EventId {
        let id = EventId(inner.next_sequence);
        inner.next_sequence += 1;
        inner.pending.insert(id);
        inner.queue.push(QueuedEvent { time, id, callback });
        id
    }

    /// Cancel a pending event. Returns `false` if it already fired, was
    /// already cancelled, or was never scheduled here.
    pub fn cancel(&self, id: EventId) -> bool {
        self.inner.lock().pending.remove(&id)
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.inner.lock().pending.contains(&id)
    }

    /// Number of events still waiting to fire
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Total callbacks executed so far
    pub fn executed_count(&self) -> u64 {
        self.inner.lock().executed
    }

    /// Stop `run()` once the clock would pass `time`.
    pub fn stop_at(&self, time: SimTime) {
        self.inner.lock().horizon = Some(time);
    }

    /// Run the next due event. Returns `false` when nothing is left to run
    /// before the horizon.
    pub fn step(&self) -> bool {
        let mut discarded = Vec::new();
        let next = {
            let mut inner = self.inner.lock();
            let horizon = inner.horizon;
            inner.pop_due(horizon, &mut discarded)
        };
        drop(discarded);

        match next {
            Some(event) => {
                (event.callback)(self);
                true
            }
            None => false,
        }
    }

    /// Run until the queue drains or the horizon set by `stop_at` is reached.
    pub fn run(&self) -> u64 {
        let mut executed = 0;
        while self.step() {
            executed += 1;
        }
        let horizon = self.inner.lock().horizon;
        if let Some(horizon) = horizon {
            self.advance_to(horizon);
        }
        tracing::debug!(executed, now = %self.now(), "Scheduler run finished");
        executed
    }

    /// Run every event due at or before `until`, then move the clock to `until`.
    pub fn run_until(&self, until: SimTime) -> u64 {
        let mut executed = 0;
        loop {
            let mut discarded = Vec::new();
            let next = {
                let mut inner = self.inner.lock();
                let limit = match inner.horizon {
                    Some(horizon) => horizon.min(until),
                    None => until,
                };
                inner.pop_due(Some(limit), &mut discarded)
            };
            drop(discarded);
            match next {
                Some(event) => {
                    (event.callback)(self);
                    executed += 1;
                }
                None => break,
            }
        }
        self.advance_to(until);
        tracing::debug!(executed, now = %self.now(), "Scheduler advanced");
        executed
    }

    fn advance_to(&self, time: SimTime) {
        let mut inner = self.inner.lock();
        if time > inner.now && time != SimTime::MAX {
            inner.now = time;
        }
    }
}
