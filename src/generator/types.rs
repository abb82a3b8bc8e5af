use crate::generator::error::{GeneratorError, GeneratorResult};
use crate::sim::{DataRate, SimTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorState {
    Unconfigured,
    Configured,
    Running,
    /// Quota exhausted while running
    Completed,
    /// Explicitly stopped while running
    Stopped,
}

impl GeneratorState {
    pub fn is_running(&self) -> bool {
        matches!(self, GeneratorState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GeneratorState::Completed | GeneratorState::Stopped)
    }
}

/// What a scheduled send step does when the endpoint rejects a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendFailurePolicy {
    /// Abort the step without rescheduling. The message does not count
    /// toward the quota and the generator stays running until stopped.
    #[default]
    Halt,
    /// Count the message toward the quota and keep the cadence.
    CountAndContinue,
    /// Stop the generator as if `stop()` had been called.
    Stop,
}

/// Message size, quota and pacing of one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Bytes per message
    pub message_size: u32,
    /// Messages to send before completing
    pub quota: u32,
    pub rate: DataRate,
}

impl GeneratorConfig {
    pub fn new(message_size: u32, quota: u32, rate: DataRate) -> Self {
        Self {
            message_size,
            quota,
            rate,
        }
    }

    pub fn validate(&self) -> GeneratorResult<()> {
        if self.message_size == 0 {
            return Err(GeneratorError::InvalidConfiguration(
                "message size must be positive".into(),
            ));
        }
        if self.quota == 0 {
            return Err(GeneratorError::InvalidConfiguration(
                "message quota must be positive".into(),
            ));
        }
        if self.rate.is_zero() {
            return Err(GeneratorError::InvalidConfiguration(
                "data rate must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Seconds between consecutive sends: bits per message over bits per second.
    pub fn inter_send_secs(&self) -> f64 {
        (self.message_size as f64 * 8.0) / self.rate.bits_per_second() as f64
    }

    pub fn inter_send_delay(&self) -> SimTime {
        SimTime::from_secs_f64(self.inter_send_secs())
    }
}

/// Point-in-time view of a generator, for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSnapshot {
    pub name: String,
    pub state: GeneratorState,
    pub messages_sent: u32,
    pub send_failures: u32,
    pub quota: u32,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_fields() {
        let rate = DataRate::from_mbps(1);
        assert!(GeneratorConfig::new(1024, 1000, rate).validate().is_ok());
        assert!(matches!(
            GeneratorConfig::new(0, 1000, rate).validate(),
            Err(GeneratorError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GeneratorConfig::new(1024, 0, rate).validate(),
            Err(GeneratorError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GeneratorConfig::new(1024, 1000, DataRate::from_bps(0)).validate(),
            Err(GeneratorError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_inter_send_delay() {
        let config = GeneratorConfig::new(1024, 1000, DataRate::from_mbps(1));
        assert!((config.inter_send_secs() - 0.008192).abs() < 1e-12);
        assert_eq!(config.inter_send_delay(), SimTime(8_192_000));

        let slow = GeneratorConfig::new(1, 1, DataRate::from_bps(8));
        assert_eq!(slow.inter_send_delay(), SimTime::from_secs(1));
    }

    #[test]
    fn test_state_helpers() {
        assert!(GeneratorState::Running.is_running());
        assert!(GeneratorState::Completed.is_terminal());
        assert!(GeneratorState::Stopped.is_terminal());
        assert!(!GeneratorState::Configured.is_terminal());
    }

    #[test]
    fn test_policy_default_is_halt() {
        assert_eq!(SendFailurePolicy::default(), SendFailurePolicy::Halt);
        let policy: SendFailurePolicy = serde_json::from_str("\"count_and_continue\"").unwrap();
        assert_eq!(policy, SendFailurePolicy::CountAndContinue);
    }
}
