//! Pacing and lifecycle properties of the traffic generator

#[path = "common/mod.rs"]
mod common;

use common::RecordingEndpoint;
use congestion_trace::generator::{GeneratorConfig, GeneratorState, TrafficGenerator};
use congestion_trace::sim::{DataRate, Scheduler, SimTime};
use std::sync::Arc;

/// Start at `start`, stop at `stop`, run to completion.
fn run_window(
    message_size: u32,
    quota: u32,
    rate: DataRate,
    start: SimTime,
    stop: SimTime,
) -> (Arc<TrafficGenerator>, Arc<RecordingEndpoint>) {
    let scheduler = Scheduler::new();
    let endpoint = RecordingEndpoint::new(&scheduler);
    let generator = TrafficGenerator::new("flow", scheduler.clone());
    generator
        .configure(endpoint.clone(), common::sink_addr(), message_size, quota, rate)
        .unwrap();

    let stopping = generator.clone();
    scheduler.schedule_at(stop, move |_| stopping.stop()).unwrap();
    let starting = generator.clone();
    scheduler
        .schedule_at(start, move |_| starting.start().unwrap())
        .unwrap();
    scheduler.run();

    (generator, endpoint)
}

#[test]
fn test_sent_count_is_min_of_quota_and_sends_before_stop() {
    let rate = DataRate::from_mbps(1);
    let delay = GeneratorConfig::new(1024, 1, rate).inter_send_delay().as_nanos();
    let cases = [
        (1000, 1, 10),
        (2000, 1, 10),
        (2000, 1, 20),
        (10, 0, 1),
        (5000, 2, 3),
    ];

    for (quota, start_s, stop_s) in cases {
        let start = SimTime::from_secs(start_s);
        let stop = SimTime::from_secs(stop_s);
        let (generator, endpoint) = run_window(1024, quota, rate, start, stop);

        // sends happen at start + k * delay strictly before the stop event
        let window = stop.as_nanos() - start.as_nanos();
        let before_stop = window.div_ceil(delay) as u32;
        let expected = quota.min(before_stop);

        assert_eq!(
            generator.sent_count(),
            expected,
            "quota {quota}, window {start_s}s..{stop_s}s"
        );
        assert_eq!(endpoint.send_times().len() as u32, expected);

        let state = generator.state();
        if expected == quota {
            assert_eq!(state, GeneratorState::Completed);
        } else {
            assert_eq!(state, GeneratorState::Stopped);
        }
    }
}

#[test]
fn test_inter_send_delay_is_bits_over_rate() {
    let cases = [
        (1024, DataRate::from_mbps(1), SimTime::from_micros(8_192)),
        (1500, DataRate::from_mbps(10), SimTime::from_micros(1_200)),
        (100, DataRate::from_kbps(64), SimTime::from_micros(12_500)),
        (1, DataRate::from_bps(8), SimTime::from_secs(1)),
    ];

    for (size, rate, expected) in cases {
        let (_, endpoint) = run_window(size, 20, rate, SimTime::ZERO, SimTime::from_secs(1_000));
        let times = endpoint.send_times();
        assert_eq!(times.len(), 20);
        assert_eq!(times[0], SimTime::ZERO);
        for pair in times.windows(2) {
            assert_eq!(pair[1] - pair[0], expected, "size {size} at {rate}");
        }
    }
}

#[test]
fn test_at_most_one_pending_send_after_every_step() {
    let scheduler = Scheduler::new();
    let endpoint = RecordingEndpoint::new(&scheduler);
    let generator = TrafficGenerator::new("flow", scheduler.clone());
    generator
        .configure(endpoint, common::sink_addr(), 1024, 50, DataRate::from_mbps(1))
        .unwrap();

    generator.start().unwrap();
    loop {
        // the generator is the only thing scheduling here
        assert!(scheduler.pending_count() <= 1);
        assert_eq!(
            generator.pending_send().is_some(),
            scheduler.pending_count() == 1
        );
        if !scheduler.step() {
            break;
        }
    }
    assert_eq!(generator.sent_count(), 50);
    assert_eq!(generator.state(), GeneratorState::Completed);
}

#[test]
fn test_no_send_after_stop_and_stop_is_idempotent() {
    let scheduler = Scheduler::new();
    let endpoint = RecordingEndpoint::new(&scheduler);
    let generator = TrafficGenerator::new("flow", scheduler.clone());
    generator
        .configure(endpoint.clone(), common::sink_addr(), 1024, 1000, DataRate::from_mbps(1))
        .unwrap();

    // stop before start changes nothing
    generator.stop();
    assert_eq!(generator.state(), GeneratorState::Configured);

    generator.start().unwrap();
    scheduler.run_until(SimTime::from_millis(100));
    let sent = generator.sent_count();

    generator.stop();
    generator.stop();
    assert_eq!(generator.state(), GeneratorState::Stopped);
    assert_eq!(scheduler.pending_count(), 0);

    scheduler.run();
    assert_eq!(generator.sent_count(), sent);
    assert!(endpoint
        .send_times()
        .iter()
        .all(|t| *t <= SimTime::from_millis(100)));
}

#[test]
fn test_nothing_scheduled_once_quota_is_met() {
    let (generator, endpoint) = run_window(
        512,
        7,
        DataRate::from_mbps(2),
        SimTime::from_secs(1),
        SimTime::from_secs(5),
    );
    assert_eq!(generator.state(), GeneratorState::Completed);
    assert!(generator.pending_send().is_none());
    assert_eq!(endpoint.send_times().len(), 7);
}
