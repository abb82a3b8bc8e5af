use serde::{Deserialize, Serialize};

const INITIAL_SSTHRESH: u32 = 65_535;

/// Congestion-window state of an endpoint.
///
/// The endpoint feeds it acknowledgements and losses and publishes whatever
/// window results; the model decides nothing else.
pub trait WindowModel: Send {
    fn name(&self) -> &str;

    /// Current window in bytes
    fn window(&self) -> u32;

    fn on_ack(&mut self, acked_bytes: u32);

    fn on_loss(&mut self);
}

/// Additive-increase / multiplicative-decrease window.
#[derive(Debug, Clone)]
pub struct AimdWindow {
    name: &'static str,
    segment: u32,
    cwnd: u32,
    ssthresh: u32,
    /// Segments added per window's worth of acks once past slow start
    increase: f64,
    /// Fraction of the window kept after a loss
    decrease: f64,
}

impl AimdWindow {
    pub fn new(name: &'static str, segment: u32, increase: f64, decrease: f64) -> Self {
        let segment = segment.max(1);
        Self {
            name,
            segment,
            cwnd: segment,
            ssthresh: INITIAL_SSTHRESH.max(segment.saturating_mul(2)),
            increase: increase.max(0.0),
            decrease: decrease.clamp(0.0, 1.0),
        }
    }

    /// Halve on loss, one segment per window.
    pub fn standard(segment: u32) -> Self {
        Self::new("standard", segment, 1.0, 0.5)
    }

    /// Keep most of the window on loss and regrow it faster.
    pub fn scalable(segment: u32) -> Self {
        Self::new("scalable", segment, 4.0, 0.8)
    }

    pub fn ssthresh(&self) -> u32 {
        self.ssthresh
    }

    pub fn in_slow_start(&self) -> bool {
        self.cwnd < self.ssthresh
    }
}

impl WindowModel for AimdWindow {
    fn name(&self) -> &str {
        self.name
    }

    fn window(&self) -> u32 {
        self.cwnd
    }

    fn on_ack(&mut self, acked_bytes: u32) {
        let growth = if self.in_slow_start() {
            acked_bytes.min(self.segment)
        } else {
            let seg = self.segment as f64;
            ((self.increase * seg * seg) / self.cwnd as f64).max(1.0) as u32
        };
        self.cwnd = self.cwnd.saturating_add(growth);
    }

    fn on_loss(&mut self) {
        let kept = (self.cwnd as f64 * self.decrease) as u32;
        self.ssthresh = kept.max(self.segment.saturating_mul(2));
        self.cwnd = self.ssthresh;
    }
}

/// Named window models selectable from scenario files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPreset {
    #[default]
    Standard,
    Scalable,
}

impl WindowPreset {
    pub fn build(&self, segment: u32) -> Box<dyn WindowModel> {
        match self {
            WindowPreset::Standard => Box::new(AimdWindow::standard(segment)),
            WindowPreset::Scalable => Box::new(AimdWindow::scalable(segment)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_start_grows_one_segment_per_ack() {
        let mut w = AimdWindow::standard(1000);
        assert_eq!(w.window(), 1000);
        w.on_ack(1000);
        w.on_ack(1000);
        assert_eq!(w.window(), 3000);
        assert!(w.in_slow_start());
    }

    #[test]
    fn test_loss_halves_standard_window() {
        let mut w = AimdWindow::standard(1000);
        for _ in 0..19 {
            w.on_ack(1000);
        }
        assert_eq!(w.window(), 20_000);

        w.on_loss();
        assert_eq!(w.window(), 10_000);
        assert_eq!(w.ssthresh(), 10_000);
        assert!(!w.in_slow_start());

        // congestion avoidance: 1000*1000/10000 = 100 bytes per ack
        w.on_ack(1000);
        assert_eq!(w.window(), 10_100);
    }

    #[test]
    fn test_scalable_reacts_less_to_loss() {
        let mut standard = AimdWindow::standard(1000);
        let mut scalable = AimdWindow::scalable(1000);
        for _ in 0..19 {
            standard.on_ack(1000);
            scalable.on_ack(1000);
        }
        standard.on_loss();
        scalable.on_loss();
        assert!(scalable.window() > standard.window());
        assert_eq!(scalable.window(), 16_000);
    }

    #[test]
    fn test_window_never_drops_below_two_segments() {
        let mut w = AimdWindow::standard(1000);
        w.on_loss();
        w.on_loss();
        assert_eq!(w.window(), 2000);
    }

    #[test]
    fn test_huge_segment_saturates() {
        let mut w = AimdWindow::standard(1 << 31);
        assert_eq!(w.window(), 1 << 31);
        assert_eq!(w.ssthresh(), u32::MAX);

        w.on_ack(1 << 31);
        assert_eq!(w.window(), u32::MAX);
        w.on_loss();
        assert_eq!(w.window(), u32::MAX);
    }

    #[test]
    fn test_preset_serde_names() {
        let preset: WindowPreset = serde_json::from_str("\"scalable\"").unwrap();
        assert_eq!(preset, WindowPreset::Scalable);
        assert_eq!(preset.build(536).name(), "scalable");
    }
}
