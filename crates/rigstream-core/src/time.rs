//! Time primitives for rigstream
//!
//! Sample times are microseconds on a local monotonic timeline. Tracker
//! supplied timestamps are carried on the frames as-is and never mixed with
//! this timeline.

use std::fmt;
use std::ops::{Add, Sub};
use std::time::{Duration, Instant};

/// Local sample time, microseconds since the owning clock started
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamTime(pub i64);

impl StreamTime {
    pub const ZERO: StreamTime = StreamTime(0);

    #[inline]
    pub fn from_micros(micros: i64) -> Self {
        StreamTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        StreamTime(millis * 1000)
    }

    #[inline]
    pub fn from_secs_f64(secs: f64) -> Self {
        StreamTime((secs * 1_000_000.0).round() as i64)
    }

    #[inline]
    pub fn as_micros(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Seconds elapsed since `earlier` (negative if `earlier` is later)
    #[inline]
    pub fn secs_since(self, earlier: StreamTime) -> f64 {
        (self.0 - earlier.0) as f64 / 1_000_000.0
    }
}

impl Add<Duration> for StreamTime {
    type Output = StreamTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        StreamTime(self.0 + rhs.as_micros() as i64)
    }
}

impl Sub<Duration> for StreamTime {
    type Output = StreamTime;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        StreamTime(self.0 - rhs.as_micros() as i64)
    }
}

impl fmt::Debug for StreamTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{:.6}s", self.as_secs_f64())
    }
}

/// Monotonic clock producing `StreamTime` values
#[derive(Clone, Copy, Debug)]
pub struct StreamClock {
    reference: Instant,
}

impl StreamClock {
    pub fn new() -> Self {
        StreamClock {
            reference: Instant::now(),
        }
    }

    pub fn now(&self) -> StreamTime {
        StreamTime(self.reference.elapsed().as_micros() as i64)
    }
}

impl Default for StreamClock {
    fn default() -> Self {
        Self::new()
    }
}
