use crate::link::types::{
    Delivery, DeliveryCallback, DropCallback, DropNotice, DropReason, LinkConfig, LinkStats,
    Packet,
};
use crate::sim::{DataRate, Scheduler, SimTime};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Receive-side packet corruption with a fixed per-packet probability.
pub struct ErrorModel {
    rate: f64,
    rng: StdRng,
}

impl ErrorModel {
    pub fn new(rate: f64, seed: u64) -> Self {
        Self {
            rate: rate.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Decide whether the next packet is corrupted.
    pub fn corrupts(&mut self) -> bool {
        self.rate > 0.0 && self.rng.gen::<f64>() < self.rate
    }
}

struct LinkState {
    busy_until: SimTime,
    /// Packets accepted but not yet fully serialised
    queued: usize,
    stats: LinkStats,
}

/// Unidirectional point-to-point link.
pub struct Link {
    name: String,
    rate: DataRate,
    delay: SimTime,
    queue_packets: usize,
    error_model: Mutex<ErrorModel>,
    state: Mutex<LinkState>,
    drop_listeners: Mutex<Vec<DropCallback>>,
}

impl Link {
    pub fn new(config: &LinkConfig, seed: u64) -> Arc<Self> {
        Arc::new(Self {
            name: config.name.clone(),
            rate: config.rate,
            delay: config.delay(),
            queue_packets: config.queue_packets.max(1),
            error_model: Mutex::new(ErrorModel::new(config.error_rate, seed)),
            state: Mutex::new(LinkState {
                busy_until: SimTime::ZERO,
                queued: 0,
                stats: LinkStats::default(),
            }),
            drop_listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rate(&self) -> DataRate {
        self.rate
    }

    pub fn delay(&self) -> SimTime {
        self.delay
    }

    pub fn stats(&self) -> LinkStats {
        self.state.lock().stats.clone()
    }

    /// Register an observer told about every packet the receiving end of this
    /// link discards. Queue overflow at the sender is only counted in
    /// `LinkStats::queue_drops`.
    pub fn subscribe_drop(&self, callback: DropCallback) {
        self.drop_listeners.lock().push(callback);
    }

    /// Offer a packet to the link. `done` fires exactly once, at the
    /// receiver's arrival time for delivered packets or right away for
    /// queue drops.
    pub fn transmit(
        self: &Arc<Self>,
        scheduler: &Scheduler,
        packet: Packet,
        done: DeliveryCallback,
    ) {
        let now = scheduler.now();
        let size = packet.size();

        let departure = {
            let mut state = self.state.lock();
            state.stats.packets_offered += 1;

            if state.queued >= self.queue_packets {
                state.stats.queue_drops += 1;
                None
            } else {
                let start = state.busy_until.max(now);
                let finish = start.saturating_add(self.rate.tx_time(size));
                state.busy_until = finish;
                state.queued += 1;
                state.stats.max_queue_depth = state.stats.max_queue_depth.max(state.queued);
                Some(finish)
            }
        };

        let Some(departure) = departure else {
            tracing::trace!(link = %self.name, flow = %packet.flow, seq = packet.sequence, "Queue overflow");
            scheduler.schedule_in(SimTime::ZERO, move |s| {
                done(s, packet, Delivery::Dropped(DropReason::QueueOverflow))
            });
            return;
        };

        let link = Arc::clone(self);
        scheduler.schedule_in(departure - now, move |s| {
            link.state.lock().queued -= 1;

            let arrival_link = Arc::clone(&link);
            s.schedule_in(link.delay, move |s| arrival_link.arrive(s, packet, done));
        });
    }

    fn arrive(&self, scheduler: &Scheduler, packet: Packet, done: DeliveryCallback) {
        let corrupted = self.error_model.lock().corrupts();

        if corrupted {
            self.state.lock().stats.receive_errors += 1;
            self.notify_drop(scheduler.now(), &packet, DropReason::ReceiveError);
            done(scheduler, packet, Delivery::Dropped(DropReason::ReceiveError));
            return;
        }

        {
            let mut state = self.state.lock();
            state.stats.packets_delivered += 1;
            state.stats.bytes_delivered += packet.size() as u64;
        }
        done(scheduler, packet, Delivery::Delivered);
    }

    fn notify_drop(&self, time: SimTime, packet: &Packet, reason: DropReason) {
        let notice = DropNotice {
            link: self.name.clone(),
            reason,
            flow: packet.flow.clone(),
            sequence: packet.sequence,
            size: packet.size(),
            time,
        };
        for listener in self.drop_listeners.lock().iter_mut() {
            listener(&notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn packet(seq: u64) -> Packet {
        Packet::new("flow", seq, Bytes::from(vec![0u8; 1024]))
    }

    type Outcomes = Arc<Mutex<Vec<(SimTime, u64, Delivery)>>>;

    fn recorder(outcomes: &Outcomes) -> DeliveryCallback {
        let outcomes = outcomes.clone();
        Box::new(move |s: &Scheduler, p: Packet, d: Delivery| {
            outcomes.lock().push((s.now(), p.sequence, d))
        })
    }

    #[test]
    fn test_delivery_time_is_serialisation_plus_delay() {
        let scheduler = Scheduler::new();
        let link = Link::new(&LinkConfig::point_to_point("a-b"), 1);
        let outcomes: Outcomes = Arc::new(Mutex::new(Vec::new()));

        link.transmit(&scheduler, packet(0), recorder(&outcomes));
        link.transmit(&scheduler, packet(1), recorder(&outcomes));
        scheduler.run();

        let outcomes = outcomes.lock();
        // 1024 B at 1 Mbps = 8.192 ms, plus 2 ms propagation
        assert_eq!(outcomes[0], (SimTime(10_192_000), 0, Delivery::Delivered));
        // second packet waits behind the first
        assert_eq!(outcomes[1], (SimTime(18_384_000), 1, Delivery::Delivered));
        assert_eq!(link.stats().packets_delivered, 2);
    }

    #[test]
    fn test_queue_overflow_drops_without_receive_notice() {
        let scheduler = Scheduler::new();
        let link = Link::new(&LinkConfig::point_to_point("bottleneck").with_queue(2), 1);
        let outcomes: Outcomes = Arc::new(Mutex::new(Vec::new()));
        let notices = Arc::new(Mutex::new(Vec::new()));

        let n = notices.clone();
        link.subscribe_drop(Box::new(move |notice: &DropNotice| {
            n.lock().push((notice.link.clone(), notice.reason, notice.sequence))
        }));

        for seq in 0..3 {
            link.transmit(&scheduler, packet(seq), recorder(&outcomes));
        }
        scheduler.run();

        assert!(notices.lock().is_empty());
        let dropped: Vec<_> = outcomes
            .lock()
            .iter()
            .filter(|(_, _, d)| matches!(d, Delivery::Dropped(_)))
            .map(|(t, seq, _)| (*t, *seq))
            .collect();
        assert_eq!(dropped, vec![(SimTime::ZERO, 2)]);

        let stats = link.stats();
        assert_eq!(stats.queue_drops, 1);
        assert_eq!(stats.packets_delivered, 2);
        assert_eq!(stats.max_queue_depth, 2);
    }

    #[test]
    fn test_error_model_drops_everything_at_rate_one() {
        let scheduler = Scheduler::new();
        let link = Link::new(&LinkConfig::point_to_point("lossy").with_error_rate(1.0), 7);
        let outcomes: Outcomes = Arc::new(Mutex::new(Vec::new()));
        let notices = Arc::new(Mutex::new(Vec::new()));

        let n = notices.clone();
        link.subscribe_drop(Box::new(move |notice: &DropNotice| {
            n.lock().push((notice.reason, notice.sequence, notice.time))
        }));

        link.transmit(&scheduler, packet(0), recorder(&outcomes));
        scheduler.run();

        assert_eq!(
            outcomes.lock()[0].2,
            Delivery::Dropped(DropReason::ReceiveError)
        );
        assert_eq!(link.stats().receive_errors, 1);
        // reported at the receiver, after serialisation and propagation
        assert_eq!(
            notices.lock().as_slice(),
            &[(DropReason::ReceiveError, 0, SimTime(10_192_000))]
        );
    }

    #[test]
    fn test_error_model_is_seeded() {
        let mut a = ErrorModel::new(0.3, 42);
        let mut b = ErrorModel::new(0.3, 42);
        let left: Vec<bool> = (0..100).map(|_| a.corrupts()).collect();
        let right: Vec<bool> = (0..100).map(|_| b.corrupts()).collect();
        assert_eq!(left, right);
        assert!(!ErrorModel::new(0.0, 1).corrupts());
    }
}
