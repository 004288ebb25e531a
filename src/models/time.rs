use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wall-clock time of day with second precision, no date component.
///
/// Serialized as `"HH:MM"` (or `"HH:MM:SS"` when seconds are non-zero),
/// matching the `hora_inicio`/`hora_salida` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    seconds: u32,
}

impl TimeOfDay {
    /// Build from hour/minute, zero seconds.
    pub fn new(hour: u32, minute: u32) -> Result<Self, String> {
        Self::with_seconds(hour, minute, 0)
    }

    /// Build from hour/minute/second.
    pub fn with_seconds(hour: u32, minute: u32, second: u32) -> Result<Self, String> {
        if hour > 23 {
            return Err(format!("hour out of range: {}", hour));
        }
        if minute > 59 {
            return Err(format!("minute out of range: {}", minute));
        }
        if second > 59 {
            return Err(format!("second out of range: {}", second));
        }
        Ok(Self {
            seconds: hour * 3600 + minute * 60 + second,
        })
    }

    /// Seconds elapsed since midnight.
    pub fn seconds_of_day(&self) -> u32 {
        self.seconds
    }

    pub fn hour(&self) -> u32 {
        self.seconds / 3600
    }

    pub fn minute(&self) -> u32 {
        (self.seconds % 3600) / 60
    }

    pub fn second(&self) -> u32 {
        self.seconds % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.second() == 0 {
            write!(f, "{:02}:{:02}", self.hour(), self.minute())
        } else {
            write!(f, "{:02}:{:02}:{:02}", self.hour(), self.minute(), self.second())
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    /// Parse `"HH:MM"` or `"HH:MM:SS"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let hour = parts
            .next()
            .ok_or_else(|| format!("invalid time: {}", s))?
            .parse::<u32>()
            .map_err(|_| format!("invalid time: {}", s))?;
        let minute = parts
            .next()
            .ok_or_else(|| format!("invalid time: {}", s))?
            .parse::<u32>()
            .map_err(|_| format!("invalid time: {}", s))?;
        let second = match parts.next() {
            Some(sec) => sec.parse::<u32>().map_err(|_| format!("invalid time: {}", s))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(format!("invalid time: {}", s));
        }
        Self::with_seconds(hour, minute, second)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Round to two decimal places, half away from zero.
///
/// Used for both slot durations and currency totals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Elapsed hours between two times of day, rounded to two decimals.
///
/// An end time earlier than the start is read as crossing midnight, so a
/// 22:00-02:00 slot yields 4.00 hours. Identical times yield 0.00.
pub fn daily_hours(inicio: TimeOfDay, salida: TimeOfDay) -> f64 {
    let mut span = salida.seconds_of_day() as i64 - inicio.seconds_of_day() as i64;
    if span < 0 {
        span += 24 * 3600;
    }
    round2(span as f64 / 3600.0)
}
