//! Time management for the alert loop
//!
//! Everything in the engine takes `now` as an argument instead of reading a
//! clock, so tests drive time explicitly. This module provides:
//! - Clock abstraction ([`TimeSource`]) for the board timer or the host clock
//! - A manually advanced clock for tests and replay
//! - [`IntervalGate`], the minimum-interval check used for sampling cadence,
//!   display refresh and snapshot logging
//! - [`WallClock`] and [`WallClockAnchor`] for calendar time in log records
//!
//! ## Wall-Clock Time
//!
//! The board's RTC is read once and pinned to the monotonic clock:
//!
//! ```text
//! anchor = (unix_ms from RTC, monotonic now)
//! unix_ms(t) = anchor.unix_ms + (t - anchor.at)
//! ```
//!
//! Records keep working when the RTC is missing or unset; they just carry no
//! calendar time.

/// Monotonic milliseconds since boot
pub type Timestamp = u64;

/// Source of monotonic time
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Host clock, milliseconds since the clock was created
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }
}

/// Manually advanced time source for testing and replay
#[derive(Debug, Clone, Default)]
pub struct MockTimeSource {
    timestamp: Timestamp,
}

impl MockTimeSource {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, ms: u64) {
        self.timestamp = self.timestamp.saturating_add(ms);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

/// Calendar clock, typically a battery-backed RTC
pub trait WallClock {
    /// Milliseconds since the Unix epoch, `None` if the clock is not set
    fn unix_ms(&self) -> Option<u64>;
}

/// Host system clock
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl WallClock for SystemClock {
    fn unix_ms(&self) -> Option<u64> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_millis() as u64)
    }
}

/// One wall-clock reading pinned to a monotonic timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClockAnchor {
    unix_ms: u64,
    at: Timestamp,
}

impl WallClockAnchor {
    pub const fn new(unix_ms: u64, at: Timestamp) -> Self {
        Self { unix_ms, at }
    }

    /// Read `clock` at monotonic time `now`
    pub fn capture<C: WallClock + ?Sized>(clock: &C, now: Timestamp) -> Option<Self> {
        clock.unix_ms().map(|unix_ms| Self::new(unix_ms, now))
    }

    /// Calendar time of monotonic timestamp `t`
    pub fn unix_ms_at(&self, t: Timestamp) -> u64 {
        if t >= self.at {
            self.unix_ms.saturating_add(t - self.at)
        } else {
            self.unix_ms.saturating_sub(self.at - t)
        }
    }
}

/// Milliseconds elapsed from `earlier` to `later`.
///
/// A clock that went backwards reports zero elapsed time rather than wrapping.
#[inline]
pub fn elapsed(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}

/// Minimum-interval gate
///
/// Opens on the first call and then at most once per `interval_ms`. Used so a
/// slow peripheral call in one cycle pushes the next sample back instead of
/// queueing a burst of catch-up cycles.
#[derive(Debug, Clone)]
pub struct IntervalGate {
    interval_ms: u64,
    last_opened: Option<Timestamp>,
}

impl IntervalGate {
    pub const fn new(interval_ms: u64) -> Self {
        Self { interval_ms, last_opened: None }
    }

    /// Returns `true` and records `now` if the interval has elapsed
    pub fn ready(&mut self, now: Timestamp) -> bool {
        let open = match self.last_opened {
            None => true,
            Some(last) => elapsed(last, now) >= self.interval_ms,
        };
        if open {
            self.last_opened = Some(now);
        }
        open
    }

    /// Forget the last opening so the next call opens immediately
    pub fn reset(&mut self) {
        self.last_opened = None;
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_opened(&self) -> Option<Timestamp> {
        self.last_opened
    }
}
