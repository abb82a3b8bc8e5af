use crate::sim::error::SimError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Virtual time, in nanoseconds since the start of a run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const MAX: SimTime = SimTime(u64::MAX);

    pub const fn from_micros(micros: u64) -> Self {
        SimTime(micros.saturating_mul(1_000))
    }

    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis.saturating_mul(1_000_000))
    }

    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs.saturating_mul(NANOS_PER_SEC))
    }

    /// Convert fractional seconds, rounding to the nearest nanosecond.
    ///
    /// Negative and non-finite inputs clamp to zero; overflow clamps to `MAX`.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return SimTime::ZERO;
        }
        let nanos = (secs * NANOS_PER_SEC as f64).round();
        if nanos >= u64::MAX as f64 {
            SimTime::MAX
        } else {
            SimTime(nanos as u64)
        }
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    pub const fn saturating_add(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(other.0))
    }

    pub const fn saturating_sub(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(other.0))
    }
}

impl Add for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> SimTime {
        self.saturating_add(rhs)
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: SimTime) -> SimTime {
        self.saturating_sub(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs_f64())
    }
}

/// Handle to a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub(crate) u64);

impl EventId {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Transmission or send rate in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataRate(u64);

impl DataRate {
    pub const fn from_bps(bits_per_second: u64) -> Self {
        DataRate(bits_per_second)
    }

    pub const fn from_kbps(kbps: u64) -> Self {
        DataRate(kbps.saturating_mul(1_000))
    }

    pub const fn from_mbps(mbps: u64) -> Self {
        DataRate(mbps.saturating_mul(1_000_000))
    }

    pub const fn bits_per_second(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Time needed to put `bytes` on the wire, rounded up to the next nanosecond.
    ///
    /// A zero rate never finishes and yields `SimTime::MAX`.
    pub fn tx_time(&self, bytes: u32) -> SimTime {
        if self.0 == 0 {
            return SimTime::MAX;
        }
        let bits = (bytes as u128) * 8;
        let rate = self.0 as u128;
        let nanos = (bits * NANOS_PER_SEC as u128 + rate - 1) / rate;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bps = self.0;
        if bps != 0 && bps % 1_000_000_000 == 0 {
            write!(f, "{}Gbps", bps / 1_000_000_000)
        } else if bps != 0 && bps % 1_000_000 == 0 {
            write!(f, "{}Mbps", bps / 1_000_000)
        } else if bps != 0 && bps % 1_000 == 0 {
            write!(f, "{}kbps", bps / 1_000)
        } else {
            write!(f, "{}bps", bps)
        }
    }
}

impl FromStr for DataRate {
    type Err = SimError;

    /// Accepts strings such as `"1Mbps"`, `"500kbps"`, `"2.5Gbps"`, `"64KBps"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| SimError::InvalidDataRate(s.to_string()))?;

        let multiplier = match unit.trim() {
            "bps" | "b/s" | "" => 1.0,
            "kbps" | "Kbps" | "kb/s" => 1e3,
            "Mbps" | "mbps" | "Mb/s" => 1e6,
            "Gbps" | "gbps" | "Gb/s" => 1e9,
            "Bps" | "B/s" => 8.0,
            "KBps" | "kBps" | "KB/s" => 8e3,
            "MBps" | "MB/s" => 8e6,
            "GBps" | "GB/s" => 8e9,
            _ => return Err(SimError::InvalidDataRate(s.to_string())),
        };

        let bits = (value * multiplier).round();
        if !bits.is_finite() || bits < 0.0 || bits > u64::MAX as f64 {
            return Err(SimError::InvalidDataRate(s.to_string()));
        }
        Ok(DataRate(bits as u64))
    }
}

impl Serialize for DataRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DataRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Bits(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Bits(bits) => Ok(DataRate(bits)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_secs_f64_rounds_to_nanos() {
        assert_eq!(SimTime::from_secs_f64(0.008192), SimTime(8_192_000));
        assert_eq!(SimTime::from_secs_f64(1.0), SimTime::from_secs(1));
        assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
        assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
    }

    #[test]
    fn test_time_arithmetic_saturates() {
        assert_eq!(SimTime::MAX + SimTime(1), SimTime::MAX);
        assert_eq!(SimTime(1) - SimTime(5), SimTime::ZERO);
    }

    #[test]
    fn test_parse_rates() {
        assert_eq!("1Mbps".parse::<DataRate>().unwrap(), DataRate::from_mbps(1));
        assert_eq!("500kbps".parse::<DataRate>().unwrap(), DataRate::from_kbps(500));
        assert_eq!(
            "2.5Gbps".parse::<DataRate>().unwrap().bits_per_second(),
            2_500_000_000
        );
        assert_eq!("1000".parse::<DataRate>().unwrap().bits_per_second(), 1000);
        assert_eq!("1KBps".parse::<DataRate>().unwrap().bits_per_second(), 8000);
        assert!("fast".parse::<DataRate>().is_err());
        assert!("10furlongs".parse::<DataRate>().is_err());
    }

    #[test]
    fn test_rate_display_round_trips_through_serde() {
        let rate = DataRate::from_mbps(10);
        assert_eq!(rate.to_string(), "10Mbps");

        let json = serde_json::to_string(&rate).unwrap();
        assert_eq!(json, "\"10Mbps\"");
        let back: DataRate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rate);

        let numeric: DataRate = serde_json::from_str("1500").unwrap();
        assert_eq!(numeric.bits_per_second(), 1500);
    }

    #[test]
    fn test_tx_time() {
        let rate = DataRate::from_mbps(1);
        assert_eq!(rate.tx_time(1024), SimTime(8_192_000));
        // 1 byte at 3 bps needs 8/3 s, rounded up
        assert_eq!(DataRate::from_bps(3).tx_time(1), SimTime(2_666_666_667));
        assert_eq!(DataRate::from_bps(0).tx_time(1), SimTime::MAX);
    }
}
