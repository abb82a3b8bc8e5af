use crate::generator::error::{GeneratorError, GeneratorResult};
use crate::generator::types::{
    GeneratorConfig, GeneratorSnapshot, GeneratorState, SendFailurePolicy,
};
use crate::metrics;
use crate::sim::{DataRate, EventId, Scheduler, SimTime};
use crate::transport::{Endpoint, TransportError};
use bytes::Bytes;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::{Arc, Weak};

struct Setup {
    endpoint: Arc<dyn Endpoint>,
    destination: SocketAddr,
    config: GeneratorConfig,
}

struct GeneratorInner {
    setup: Option<Setup>,
    state: GeneratorState,
    /// The one outstanding scheduled send, if any
    send_event: Option<EventId>,
    sent: u32,
    failures: u32,
    last_error: Option<TransportError>,
}

/// Sends `quota` messages of `message_size` bytes, one every
/// `message_size * 8 / rate` seconds of virtual time.
///
/// Instances are single-use: once completed or stopped they cannot be
/// started again.
pub struct TrafficGenerator {
    name: String,
    scheduler: Scheduler,
    policy: SendFailurePolicy,
    this: Weak<TrafficGenerator>,
    inner: Mutex<GeneratorInner>,
}

impl TrafficGenerator {
    pub fn new(name: impl Into<String>, scheduler: Scheduler) -> Arc<Self> {
        Self::with_policy(name, scheduler, SendFailurePolicy::default())
    }

    pub fn with_policy(
        name: impl Into<String>,
        scheduler: Scheduler,
        policy: SendFailurePolicy,
    ) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|this| Self {
            name,
            scheduler,
            policy,
            this: this.clone(),
            inner: Mutex::new(GeneratorInner {
                setup: None,
                state: GeneratorState::Unconfigured,
                send_event: None,
                sent: 0,
                failures: 0,
                last_error: None,
            }),
        })
    }

    /// One-time setup. Parameters are validated before anything is stored.
    pub fn configure(
        &self,
        endpoint: Arc<dyn Endpoint>,
        destination: SocketAddr,
        message_size: u32,
        quota: u32,
        rate: DataRate,
    ) -> GeneratorResult<()> {
        let config = GeneratorConfig::new(message_size, quota, rate);
        config.validate()?;

        let mut inner = self.inner.lock();
        if inner.state != GeneratorState::Unconfigured {
            return Err(GeneratorError::AlreadyConfigured);
        }
        inner.setup = Some(Setup {
            endpoint,
            destination,
            config,
        });
        inner.state = GeneratorState::Configured;
        tracing::debug!(
            generator = %self.name,
            %destination,
            message_size,
            quota,
            %rate,
            "Generator configured"
        );
        Ok(())
    }

    /// Bind, connect and send the first message.
    ///
    /// A bind, connect or first-send failure is returned here; the generator
    /// stays `Running` and the owner is expected to `stop()` it.
    pub fn start(&self) -> GeneratorResult<()> {
        let (endpoint, destination) = {
            let mut inner = self.inner.lock();
            match inner.state {
                GeneratorState::Configured => {}
                GeneratorState::Unconfigured => return Err(GeneratorError::NotConfigured),
                GeneratorState::Running => return Err(GeneratorError::DoubleStart),
                state @ (GeneratorState::Completed | GeneratorState::Stopped) => {
                    return Err(GeneratorError::Finished(state))
                }
            }
            let setup = inner.setup.as_ref().ok_or(GeneratorError::NotConfigured)?;
            let endpoint = Arc::clone(&setup.endpoint);
            let destination = setup.destination;

            inner.state = GeneratorState::Running;
            inner.sent = 0;
            (endpoint, destination)
        };
        metrics::record_generator_transition(&self.name, GeneratorState::Running);
        tracing::info!(generator = %self.name, now = %self.scheduler.now(), "Generator started");

        let local = endpoint.bind()?;
        endpoint.connect(destination)?;
        tracing::debug!(generator = %self.name, %local, %destination, "Endpoint connected");

        self.send_message()
    }

    /// Stop sending. Cancels the pending send and closes the endpoint.
    ///
    /// A no-op before `start()` and on repeated calls.
    pub fn stop(&self) {
        let endpoint = {
            let mut inner = self.inner.lock();
            match inner.state {
                GeneratorState::Unconfigured
                | GeneratorState::Configured
                | GeneratorState::Stopped => return,
                GeneratorState::Running => {
                    inner.state = GeneratorState::Stopped;
                }
                GeneratorState::Completed => {}
            }
            if let Some(id) = inner.send_event.take() {
                if self.scheduler.is_pending(id) {
                    self.scheduler.cancel(id);
                }
            }
            inner.setup.as_ref().map(|setup| Arc::clone(&setup.endpoint))
        };

        if let Some(endpoint) = endpoint {
            if endpoint.is_open() {
                if let Err(e) = endpoint.close() {
                    tracing::warn!(generator = %self.name, error = %e, "Failed to close endpoint");
                }
            }
        }

        let state = self.state();
        if state == GeneratorState::Stopped {
            metrics::record_generator_transition(&self.name, state);
        }
        tracing::info!(
            generator = %self.name,
            now = %self.scheduler.now(),
            sent = self.sent_count(),
            ?state,
            "Generator stopped"
        );
    }

    /// One send step: hand a message to the endpoint, then re-arm.
    fn send_message(&self) -> GeneratorResult<()> {
        let (endpoint, config) = {
            let mut inner = self.inner.lock();
            // the event that brought us here has fired
            inner.send_event = None;
            if !inner.state.is_running() {
                return Ok(());
            }
            let setup = inner.setup.as_ref().ok_or(GeneratorError::NotConfigured)?;
            (Arc::clone(&setup.endpoint), setup.config)
        };

        let payload = Bytes::from(vec![0u8; config.message_size as usize]);
        match endpoint.send(payload) {
            Ok(_) => {
                self.inner.lock().sent += 1;
                metrics::record_message_sent(&self.name, config.message_size);
            }
            Err(e) => {
                metrics::record_send_failure(&self.name);
                {
                    let mut inner = self.inner.lock();
                    inner.failures += 1;
                    inner.last_error = Some(e.clone());
                }
                tracing::warn!(
                    generator = %self.name,
                    now = %self.scheduler.now(),
                    error = %e,
                    policy = ?self.policy,
                    "Send failed"
                );
                match self.policy {
                    SendFailurePolicy::Halt => return Err(e.into()),
                    SendFailurePolicy::Stop => {
                        self.stop();
                        return Err(e.into());
                    }
                    SendFailurePolicy::CountAndContinue => {
                        self.inner.lock().sent += 1;
                    }
                }
            }
        }

        let exhausted = {
            let mut inner = self.inner.lock();
            if inner.sent >= config.quota && inner.state.is_running() {
                inner.state = GeneratorState::Completed;
                true
            } else {
                false
            }
        };
        if exhausted {
            metrics::record_generator_transition(&self.name, GeneratorState::Completed);
            tracing::info!(
                generator = %self.name,
                now = %self.scheduler.now(),
                sent = config.quota,
                "Generator reached its quota"
            );
            return Ok(());
        }

        self.schedule_next(config.inter_send_delay());
        Ok(())
    }

    /// Re-arm the single pending send `delay` from now.
    fn schedule_next(&self, delay: SimTime) {
        let mut inner = self.inner.lock();
        if !inner.state.is_running() {
            return;
        }
        if let Some(stale) = inner.send_event.take() {
            self.scheduler.cancel(stale);
        }

        let this = self.this.clone();
        let id = self.scheduler.schedule_in(delay, move |_| {
            if let Some(generator) = this.upgrade() {
                // failures are retained in `last_error`
                let _ = generator.send_message();
            }
        });
        inner.send_event = Some(id);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> SendFailurePolicy {
        self.policy
    }

    pub fn state(&self) -> GeneratorState {
        self.inner.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn sent_count(&self) -> u32 {
        self.inner.lock().sent
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failures
    }

    pub fn last_error(&self) -> Option<TransportError> {
        self.inner.lock().last_error.clone()
    }

    pub fn config(&self) -> Option<GeneratorConfig> {
        self.inner.lock().setup.as_ref().map(|setup| setup.config)
    }

    /// The outstanding scheduled send, if one is still pending
    pub fn pending_send(&self) -> Option<EventId> {
        let inner = self.inner.lock();
        inner
            .send_event
            .filter(|id| self.scheduler.is_pending(*id))
    }

    pub fn snapshot(&self) -> GeneratorSnapshot {
        let inner = self.inner.lock();
        GeneratorSnapshot {
            name: self.name.clone(),
            state: inner.state,
            messages_sent: inner.sent,
            send_failures: inner.failures,
            quota: inner.setup.as_ref().map_or(0, |setup| setup.config.quota),
            last_error: inner.last_error.as_ref().map(|e| e.to_string()),
        }
    }
}

impl Drop for TrafficGenerator {
    fn drop(&mut self) {
        if let Some(id) = self.inner.get_mut().send_event.take() {
            self.scheduler.cancel(id);
        }
    }
}
