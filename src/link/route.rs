use crate::link::link::Link;
use crate::link::types::{Delivery, DeliveryCallback, Packet};
use crate::sim::{Scheduler, SimTime};
use std::sync::Arc;

/// An ordered list of links a flow's packets traverse.
#[derive(Clone)]
pub struct Route {
    hops: Arc<[Arc<Link>]>,
}

impl Route {
    /// Returns `None` for an empty hop list.
    pub fn new(hops: Vec<Arc<Link>>) -> Option<Self> {
        if hops.is_empty() {
            return None;
        }
        Some(Self { hops: hops.into() })
    }

    pub fn hops(&self) -> &[Arc<Link>] {
        &self.hops
    }

    /// Sum of one-way propagation delays along the route
    pub fn propagation_delay(&self) -> SimTime {
        self.hops
            .iter()
            .fold(SimTime::ZERO, |acc, link| acc + link.delay())
    }

    /// Send a packet hop by hop. `done` fires once with the final outcome:
    /// delivered at the last hop, or dropped at whichever hop discarded it.
    pub fn transmit(&self, scheduler: &Scheduler, packet: Packet, done: DeliveryCallback) {
        forward(self.hops.clone(), 0, scheduler, packet, done);
    }
}

fn forward(
    hops: Arc<[Arc<Link>]>,
    index: usize,
    scheduler: &Scheduler,
    packet: Packet,
    done: DeliveryCallback,
) {
    let link = Arc::clone(&hops[index]);
    let last = index + 1 == hops.len();

    link.transmit(
        scheduler,
        packet,
        Box::new(move |s: &Scheduler, packet: Packet, delivery: Delivery| {
            match delivery {
                Delivery::Delivered if !last => forward(hops, index + 1, s, packet, done),
                outcome => done(s, packet, outcome),
            }
        }),
    );
}
