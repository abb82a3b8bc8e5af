use crate::link::{Delivery, Packet, Route};
use crate::sim::Scheduler;
use crate::transport::endpoint::{Endpoint, WindowCallback};
use crate::transport::error::{TransportError, TransportResult};
use crate::transport::types::{SocketState, SocketStats};
use crate::transport::window::WindowModel;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Weak};

const EPHEMERAL_PORT: u16 = 49153;

struct SocketInner {
    state: SocketState,
    local: Option<SocketAddr>,
    peer: Option<SocketAddr>,
    window: Box<dyn WindowModel>,
    /// Bytes handed to the route and not yet acked or lost
    in_flight: u32,
    backlog: VecDeque<Bytes>,
    next_sequence: u64,
    stats: SocketStats,
}

/// Reference endpoint that carries messages over a `Route`.
///
/// Messages wait in a local backlog until the congestion window has room.
/// A delivered message is acknowledged after the route's propagation delay;
/// acks and losses drive the window model, and every window change is
/// published to subscribers. There is no retransmission.
pub struct SimSocket {
    label: String,
    local_ip: IpAddr,
    scheduler: Scheduler,
    route: Route,
    this: Weak<SimSocket>,
    inner: Mutex<SocketInner>,
    listeners: Mutex<Vec<WindowCallback>>,
}

impl SimSocket {
    pub fn new(
        label: impl Into<String>,
        local_ip: IpAddr,
        scheduler: Scheduler,
        route: Route,
        window: Box<dyn WindowModel>,
    ) -> Arc<Self> {
        let label = label.into();
        Arc::new_cyclic(|this| Self {
            label,
            local_ip,
            scheduler,
            route,
            this: this.clone(),
            inner: Mutex::new(SocketInner {
                state: SocketState::Unbound,
                local: None,
                peer: None,
                window,
                in_flight: 0,
                backlog: VecDeque::new(),
                next_sequence: 0,
                stats: SocketStats::default(),
            }),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> SocketState {
        self.inner.lock().state
    }

    pub fn window(&self) -> u32 {
        self.inner.lock().window.window()
    }

    pub fn window_model(&self) -> String {
        self.inner.lock().window.name().to_string()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().local
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().peer
    }

    pub fn in_flight(&self) -> u32 {
        self.inner.lock().in_flight
    }

    pub fn backlog_len(&self) -> usize {
        self.inner.lock().backlog.len()
    }

    pub fn stats(&self) -> SocketStats {
        self.inner.lock().stats.clone()
    }

    /// Move backlog onto the route while the window allows.
    fn pump(&self) {
        let mut ready = Vec::new();
        {
            let mut inner = self.inner.lock();
            if inner.state != SocketState::Connected {
                return;
            }
            while let Some(front) = inner.backlog.front() {
                let size = u32::try_from(front.len()).unwrap_or(u32::MAX);
                // always allow one message in flight so oversize messages still move
                if inner.in_flight > 0
                    && inner.in_flight.saturating_add(size) > inner.window.window()
                {
                    break;
                }
                let Some(payload) = inner.backlog.pop_front() else {
                    break;
                };
                inner.in_flight = inner.in_flight.saturating_add(size);
                let sequence = inner.next_sequence;
                inner.next_sequence += 1;
                inner.stats.messages_transmitted += 1;
                ready.push(Packet::new(self.label.clone(), sequence, payload));
            }
        }

        for packet in ready {
            let this = self.this.clone();
            self.route.transmit(
                &self.scheduler,
                packet,
                Box::new(move |s: &Scheduler, packet: Packet, delivery: Delivery| {
                    if let Some(socket) = this.upgrade() {
                        socket.on_outcome(s, packet, delivery);
                    }
                }),
            );
        }
    }

    fn on_outcome(&self, scheduler: &Scheduler, packet: Packet, delivery: Delivery) {
        let size = packet.size();
        match delivery {
            Delivery::Delivered => {
                let this = self.this.clone();
                scheduler.schedule_in(self.route.propagation_delay(), move |_| {
                    if let Some(socket) = this.upgrade() {
                        socket.on_ack(size);
                    }
                });
            }
            Delivery::Dropped(reason) => {
                tracing::trace!(socket = %self.label, seq = packet.sequence, %reason, "Message lost");
                self.on_loss(size);
            }
        }
    }

    fn on_ack(&self, size: u32) {
        self.update_window(size, |window| window.on_ack(size), |stats| {
            stats.messages_acked += 1
        });
    }

    fn on_loss(&self, size: u32) {
        self.update_window(size, |window| window.on_loss(), |stats| {
            stats.messages_lost += 1
        });
    }

    fn update_window(
        &self,
        settled: u32,
        adjust: impl FnOnce(&mut dyn WindowModel),
        count: impl FnOnce(&mut SocketStats),
    ) {
        let change = {
            let mut inner = self.inner.lock();
            inner.in_flight = inner.in_flight.saturating_sub(settled);
            count(&mut inner.stats);
            if inner.state == SocketState::Closed {
                return;
            }
            let old = inner.window.window();
            adjust(inner.window.as_mut());
            let new = inner.window.window();
            if old != new {
                inner.stats.window_changes += 1;
                Some((old, new))
            } else {
                None
            }
        };

        if let Some((old, new)) = change {
            for listener in self.listeners.lock().iter_mut() {
                listener(old, new);
            }
        }
        self.pump();
    }
}

impl Endpoint for SimSocket {
    fn bind(&self) -> TransportResult<SocketAddr> {
        let mut inner = self.inner.lock();
        match inner.state {
            SocketState::Unbound => {
                let local = SocketAddr::new(self.local_ip, EPHEMERAL_PORT);
                inner.local = Some(local);
                inner.state = SocketState::Bound;
                Ok(local)
            }
            SocketState::Closed => Err(TransportError::Closed),
            SocketState::Bound | SocketState::Connected => Err(TransportError::AlreadyBound(
                inner.local.unwrap_or_else(|| SocketAddr::new(self.local_ip, 0)),
            )),
        }
    }

    fn connect(&self, peer: SocketAddr) -> TransportResult<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            SocketState::Bound => {
                inner.peer = Some(peer);
                inner.state = SocketState::Connected;
                tracing::debug!(socket = %self.label, %peer, "Connected");
                Ok(())
            }
            SocketState::Unbound => Err(TransportError::NotBound),
            SocketState::Closed => Err(TransportError::Closed),
            SocketState::Connected => Err(TransportError::AlreadyConnected(
                inner.peer.unwrap_or(peer),
            )),
        }
    }

    fn send(&self, payload: Bytes) -> TransportResult<usize> {
        let len = payload.len();
        {
            let mut inner = self.inner.lock();
            match inner.state {
                SocketState::Connected => {}
                SocketState::Closed => return Err(TransportError::Closed),
                SocketState::Unbound | SocketState::Bound => {
                    return Err(TransportError::NotConnected)
                }
            }
            if payload.is_empty() {
                return Err(TransportError::Rejected("empty message".into()));
            }
            inner.stats.messages_accepted += 1;
            inner.stats.bytes_accepted += len as u64;
            inner.backlog.push_back(payload);
        }
        self.pump();
        Ok(len)
    }

    fn close(&self) -> TransportResult<()> {
        let mut inner = self.inner.lock();
        if inner.state == SocketState::Closed {
            return Err(TransportError::Closed);
        }
        inner.state = SocketState::Closed;
        let discarded = inner.backlog.len();
        inner.backlog.clear();
        tracing::debug!(socket = %self.label, discarded, "Closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.lock().state.is_open()
    }

    fn subscribe_window_change(&self, callback: WindowCallback) {
        self.listeners.lock().push(callback);
    }
}
