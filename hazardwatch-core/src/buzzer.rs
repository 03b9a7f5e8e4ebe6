//! Non-blocking buzzer patterns
//!
//! ## Overview
//!
//! A pattern is `pulses` beeps of `on_ms`, each followed by `off_ms` of
//! silence. Driving that with sleeps would stall sampling for over a second
//! on a critical alert, so [`ToneScheduler`] is a small state machine the
//! loop advances once per tick:
//!
//! ```text
//!          start()               on_ms elapsed
//!   Idle ──────────→ Pulsing(on) ──────────────→ Pulsing(off)
//!    ↑                    ↑                           │
//!    │                    └──── more pulses ──────────┤ off_ms elapsed
//!    └───────────────────── last pulse ───────────────┘
//! ```
//!
//! Starting a pattern while one is playing replaces it from the next tick.
//! Phase timing restarts from the tick that observed the transition, so a
//! late tick stretches the pattern instead of bunching pulses together.

use serde::{Deserialize, Serialize};

use crate::errors::SinkResult;
use crate::sinks::Buzzer;
use crate::time::{elapsed, Timestamp};

/// Beep pattern for one alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzerPattern {
    pub pulses: u8,
    pub on_ms: u32,
    pub off_ms: u32,
}

impl BuzzerPattern {
    pub const fn new(pulses: u8, on_ms: u32, off_ms: u32) -> Self {
        Self { pulses, on_ms, off_ms }
    }

    /// Time from first pulse to idle
    pub const fn total_ms(&self) -> u64 {
        self.pulses as u64 * (self.on_ms as u64 + self.off_ms as u64)
    }
}

/// Output pin driving the buzzer
pub trait BuzzerPin {
    /// Drive the buzzer on (`true`) or off
    fn set_level(&mut self, on: bool) -> SinkResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToneState {
    Idle,
    Pulsing {
        pattern: BuzzerPattern,
        pulse: u8,
        on: bool,
        since: Timestamp,
    },
}

/// Pattern state machine, advanced by [`tick`](ToneScheduler::tick)
#[derive(Debug, Clone)]
pub struct ToneScheduler {
    pending: Option<BuzzerPattern>,
    state: ToneState,
}

impl Default for ToneScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneScheduler {
    pub const fn new() -> Self {
        Self { pending: None, state: ToneState::Idle }
    }

    /// Queue `pattern`, replacing anything playing
    pub fn start(&mut self, pattern: BuzzerPattern) {
        self.pending = Some(pattern);
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && self.state == ToneState::Idle
    }

    /// Whether the pin should currently be on
    pub fn is_on(&self) -> bool {
        matches!(self.state, ToneState::Pulsing { on: true, .. })
    }

    /// Advance to `now`. Returns the new pin level when it changes.
    pub fn tick(&mut self, now: Timestamp) -> Option<bool> {
        if let Some(pattern) = self.pending.take() {
            let was_on = self.is_on();
            if pattern.pulses == 0 || pattern.on_ms == 0 {
                self.state = ToneState::Idle;
                return was_on.then_some(false);
            }
            self.state = ToneState::Pulsing { pattern, pulse: 0, on: true, since: now };
            return (!was_on).then_some(true);
        }

        let ToneState::Pulsing { pattern, pulse, on, since } = self.state else {
            return None;
        };
        let last_pulse = pulse.saturating_add(1) >= pattern.pulses;

        if on {
            if elapsed(since, now) < u64::from(pattern.on_ms) {
                return None;
            }
            if pattern.off_ms > 0 {
                self.state = ToneState::Pulsing { pattern, pulse, on: false, since: now };
                return Some(false);
            }
            // No gap: consecutive pulses run together as one tone
            if last_pulse {
                self.state = ToneState::Idle;
                Some(false)
            } else {
                self.state = ToneState::Pulsing { pattern, pulse: pulse + 1, on: true, since: now };
                None
            }
        } else {
            if elapsed(since, now) < u64::from(pattern.off_ms) {
                return None;
            }
            if last_pulse {
                self.state = ToneState::Idle;
                None
            } else {
                self.state = ToneState::Pulsing { pattern, pulse: pulse + 1, on: true, since: now };
                Some(true)
            }
        }
    }
}

/// [`Buzzer`] sink on top of a pin and a [`ToneScheduler`]
#[derive(Debug)]
pub struct ScheduledBuzzer<P: BuzzerPin> {
    pin: P,
    scheduler: ToneScheduler,
}

impl<P: BuzzerPin> ScheduledBuzzer<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, scheduler: ToneScheduler::new() }
    }

    pub fn scheduler(&self) -> &ToneScheduler {
        &self.scheduler
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn into_pin(self) -> P {
        self.pin
    }
}

impl<P: BuzzerPin> Buzzer for ScheduledBuzzer<P> {
    fn play(&mut self, pattern: BuzzerPattern) -> SinkResult {
        self.scheduler.start(pattern);
        Ok(())
    }

    fn tick(&mut self, now: Timestamp) {
        if let Some(level) = self.scheduler.tick(now) {
            if let Err(err) = self.pin.set_level(level) {
                log::warn!("buzzer pin: {}", err);
            }
        }
    }
}
