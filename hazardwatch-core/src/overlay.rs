//! Alert overlay timing
//!
//! The most recent admitted alert is drawn as a banner over the status screen
//! for a fixed time. A newer alert replaces it immediately. An expired event
//! stays recorded (status reports still name it) until the next dispatch or
//! [`OverlayTimer::acknowledge`].

use crate::alert::{AlertEvent, AlertKind, Message};
use crate::constants::OVERLAY_DURATION_MS;
use crate::time::{elapsed, Timestamp};

/// What the overlay is currently holding
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub active_event: Option<AlertEvent>,
    pub shown_since: Timestamp,
    pub duration_ms: u64,
}

/// Banner handed to the display sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayBanner {
    pub kind: AlertKind,
    pub message: Message,
}

impl OverlayBanner {
    pub fn from_event(event: &AlertEvent) -> Self {
        Self { kind: event.kind(), message: crate::alert::truncate(event.message()) }
    }
}

/// Decides whether the alert banner is visible
#[derive(Debug, Clone)]
pub struct OverlayTimer {
    state: OverlayState,
}

impl Default for OverlayTimer {
    fn default() -> Self {
        Self::new(OVERLAY_DURATION_MS)
    }
}

impl OverlayTimer {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            state: OverlayState { active_event: None, shown_since: 0, duration_ms },
        }
    }

    /// Replace the overlay with `event`, shown from `now`
    pub fn show(&mut self, event: AlertEvent, now: Timestamp) {
        self.state.active_event = Some(event);
        self.state.shown_since = now;
    }

    pub fn should_show_overlay(&self, now: Timestamp) -> bool {
        self.state.active_event.is_some()
            && elapsed(self.state.shown_since, now) < self.state.duration_ms
    }

    /// Drop the current event
    pub fn acknowledge(&mut self) {
        self.state.active_event = None;
    }

    /// Banner to draw at `now`, if any
    pub fn banner(&self, now: Timestamp) -> Option<OverlayBanner> {
        if !self.should_show_overlay(now) {
            return None;
        }
        self.state.active_event.as_ref().map(OverlayBanner::from_event)
    }

    pub fn active_event(&self) -> Option<&AlertEvent> {
        self.state.active_event.as_ref()
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }
}
