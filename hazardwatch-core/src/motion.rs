//! Sustained Motion Detection
//!
//! ## Overview
//!
//! A single accelerometer jolt (door slam, someone bumping the enclosure) must
//! not raise an earthquake alert. [`MotionDebouncer`] turns raw per-axis
//! deltas into a boolean that only goes high after motion has persisted for a
//! minimum duration:
//!
//! ```text
//!            dx or dy > threshold
//!   Still ─────────────────────────→ Arming (sustained_since = now)
//!     ↑                                  │
//!     │ dx and dy <= threshold           │ now - sustained_since >= sustain_ms
//!     │                                  ↓
//!     └───────────────────────────── Active
//! ```
//!
//! Any sample at or below threshold drops straight back to `Still` and clears
//! the window, even mid-event. A momentary pause during real shaking
//! therefore re-arms the full duration.
//!
//! The baseline starts at `(0, 0)`, so the first sample is compared against
//! zero. With gravity on neither horizontal axis that delta is small on a
//! level board.

use libm::fabsf;

use crate::config::MotionConfig;
use crate::time::{elapsed, Timestamp};

/// Debouncer state, exposed for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionState {
    /// X acceleration of the previous sample (m/s²)
    pub last_x: f32,
    /// Y acceleration of the previous sample (m/s²)
    pub last_y: f32,
    /// Start of the current above-threshold run
    pub sustained_since: Option<Timestamp>,
    /// Motion has persisted for the full sustain window
    pub active: bool,
}

/// Minimum-duration integrator over accelerometer deltas
#[derive(Debug, Clone)]
pub struct MotionDebouncer {
    config: MotionConfig,
    state: MotionState,
}

impl Default for MotionDebouncer {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

impl MotionDebouncer {
    pub fn new(config: MotionConfig) -> Self {
        Self { config, state: MotionState::default() }
    }

    /// Feed one sample, returns whether motion is currently sustained
    pub fn update(&mut self, ax: f32, ay: f32, now: Timestamp) -> bool {
        let dx = fabsf(ax - self.state.last_x);
        let dy = fabsf(ay - self.state.last_y);
        self.state.last_x = ax;
        self.state.last_y = ay;

        if dx > self.config.threshold || dy > self.config.threshold {
            let since = *self.state.sustained_since.get_or_insert(now);
            if elapsed(since, now) >= self.config.sustain_ms {
                if !self.state.active {
                    log::debug!("sustained motion after {} ms", elapsed(since, now));
                }
                self.state.active = true;
            }
        } else {
            self.state.sustained_since = None;
            self.state.active = false;
        }

        self.state.active
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Back to the power-on state, baseline `(0, 0)`
    pub fn reset(&mut self) {
        self.state = MotionState::default();
    }
}
