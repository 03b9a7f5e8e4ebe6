//! Per-type alert cooldowns
//!
//! Stops a channel that sits above its threshold from re-alerting every
//! sampling cycle. Each alert type has its own [`DebounceEntry`]; a candidate
//! is admitted iff its type has never fired or its cooldown has elapsed.
//!
//! `last_fired_at` changes only on admission. A suppressed candidate does
//! not extend the window, so a flapping sensor still re-alerts once per
//! cooldown.

use crate::alert::{AlertEvent, AlertKind};
use crate::config::CooldownConfig;
use crate::time::{elapsed, Timestamp};

/// Cooldown bookkeeping for one alert type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceEntry {
    pub last_fired_at: Option<Timestamp>,
    pub cooldown_ms: u64,
}

impl DebounceEntry {
    pub const fn new(cooldown_ms: u64) -> Self {
        Self { last_fired_at: None, cooldown_ms }
    }

    /// Whether an event at `now` would be admitted
    pub fn is_ready(&self, now: Timestamp) -> bool {
        match self.last_fired_at {
            None => true,
            // Clock regression saturates to zero elapsed, i.e. not ready
            Some(last) => elapsed(last, now) >= self.cooldown_ms,
        }
    }
}

/// One [`DebounceEntry`] per [`AlertKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceTable {
    entries: [DebounceEntry; AlertKind::COUNT],
}

impl Default for DebounceTable {
    fn default() -> Self {
        Self::new(&CooldownConfig::default())
    }
}

impl DebounceTable {
    pub fn new(cooldowns: &CooldownConfig) -> Self {
        let mut entries = [DebounceEntry::new(cooldowns.default_ms); AlertKind::COUNT];
        for kind in AlertKind::ALL {
            entries[kind.index()].cooldown_ms = cooldowns.for_kind(kind);
        }
        Self { entries }
    }

    pub fn entry(&self, kind: AlertKind) -> &DebounceEntry {
        &self.entries[kind.index()]
    }

    pub fn last_fired_at(&self, kind: AlertKind) -> Option<Timestamp> {
        self.entry(kind).last_fired_at
    }

    pub fn set_cooldown(&mut self, kind: AlertKind, cooldown_ms: u64) {
        self.entries[kind.index()].cooldown_ms = cooldown_ms;
    }

    /// Forget every firing, keep cooldowns
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.last_fired_at = None;
        }
    }
}

/// Cooldown gate between evaluation and dispatch
#[derive(Debug, Clone, Default)]
pub struct AlertRateLimiter {
    admitted: u32,
    suppressed: u32,
}

impl AlertRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `candidate` if its type is out of cooldown, recording the firing
    pub fn admit(&mut self, candidate: &AlertEvent, table: &mut DebounceTable, now: Timestamp) -> bool {
        let entry = &mut table.entries[candidate.kind().index()];
        if entry.is_ready(now) {
            entry.last_fired_at = Some(now);
            self.admitted = self.admitted.saturating_add(1);
            true
        } else {
            log::debug!(
                "suppressed {}, {} ms of {} ms cooldown elapsed",
                candidate.kind(),
                entry.last_fired_at.map_or(0, |last| elapsed(last, now)),
                entry.cooldown_ms
            );
            self.suppressed = self.suppressed.saturating_add(1);
            false
        }
    }

    /// Total admitted since construction
    pub fn admitted_count(&self) -> u32 {
        self.admitted
    }

    /// Total suppressed since construction
    pub fn suppressed_count(&self) -> u32 {
        self.suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertBuilder;

    fn event(kind: AlertKind, at: Timestamp) -> AlertEvent {
        AlertBuilder::new(kind, at).build()
    }

    #[test]
    fn first_candidate_is_admitted() {
        let mut limiter = AlertRateLimiter::new();
        let mut table = DebounceTable::default();
        assert!(limiter.admit(&event(AlertKind::Flood, 0), &mut table, 0));
        assert_eq!(table.last_fired_at(AlertKind::Flood), Some(0));
    }

    #[test]
    fn cooldown_suppresses_then_releases() {
        let mut limiter = AlertRateLimiter::new();
        let mut table = DebounceTable::default();
        assert!(limiter.admit(&event(AlertKind::Fire, 1000), &mut table, 1000));
        assert!(!limiter.admit(&event(AlertKind::Fire, 3000), &mut table, 3000));
        assert_eq!(table.last_fired_at(AlertKind::Fire), Some(1000));
        assert!(!limiter.admit(&event(AlertKind::Fire, 5999), &mut table, 5999));
        assert!(limiter.admit(&event(AlertKind::Fire, 6000), &mut table, 6000));

        assert_eq!(limiter.admitted_count(), 2);
        assert_eq!(limiter.suppressed_count(), 2);
    }

    #[test]
    fn types_are_independent() {
        let mut limiter = AlertRateLimiter::new();
        let mut table = DebounceTable::default();
        assert!(limiter.admit(&event(AlertKind::Fire, 0), &mut table, 0));
        assert!(limiter.admit(&event(AlertKind::Flood, 10), &mut table, 10));
        assert_eq!(table.last_fired_at(AlertKind::Tilt), None);
    }

    #[test]
    fn clock_regression_is_not_elapsed() {
        let mut limiter = AlertRateLimiter::new();
        let mut table = DebounceTable::default();
        assert!(limiter.admit(&event(AlertKind::Gas, 10_000), &mut table, 10_000));
        assert!(!limiter.admit(&event(AlertKind::Gas, 2_000), &mut table, 2_000));
        assert_eq!(table.last_fired_at(AlertKind::Gas), Some(10_000));
    }

    #[test]
    fn per_type_overrides() {
        let cooldowns = CooldownConfig::default().with_override(AlertKind::Tilt, 500);
        let mut table = DebounceTable::new(&cooldowns);
        assert_eq!(table.entry(AlertKind::Tilt).cooldown_ms, 500);
        assert_eq!(table.entry(AlertKind::Flood).cooldown_ms, 5000);

        let mut limiter = AlertRateLimiter::new();
        assert!(limiter.admit(&event(AlertKind::Tilt, 0), &mut table, 0));
        assert!(limiter.admit(&event(AlertKind::Tilt, 500), &mut table, 500));

        table.set_cooldown(AlertKind::Tilt, 10_000);
        assert!(!limiter.admit(&event(AlertKind::Tilt, 1000), &mut table, 1000));

        table.clear();
        assert!(limiter.admit(&event(AlertKind::Tilt, 1100), &mut table, 1100));
    }
}
