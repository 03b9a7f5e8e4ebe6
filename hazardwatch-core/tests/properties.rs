//! Property tests for cooldown, motion and buzzer timing

use proptest::prelude::*;

use hazardwatch_core::{
    alert::{AlertBuilder, AlertKind},
    buzzer::{BuzzerPattern, ToneScheduler},
    config::{CooldownConfig, MotionConfig},
    limiter::{AlertRateLimiter, DebounceTable},
    motion::MotionDebouncer,
};

fn kind_strategy() -> impl Strategy<Value = AlertKind> {
    prop::sample::select(AlertKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn same_type_within_cooldown_dispatches_once(
        kind in kind_strategy(),
        cooldown in 1u64..60_000,
        start in 0u64..1_000_000,
        gap_fraction in 0.0f64..1.0,
    ) {
        let gap = ((cooldown as f64) * gap_fraction) as u64;
        prop_assume!(gap < cooldown);

        let mut table = DebounceTable::new(&CooldownConfig { default_ms: cooldown, ..CooldownConfig::default() });
        let mut limiter = AlertRateLimiter::new();
        let first = AlertBuilder::new(kind, start).build();
        let second = AlertBuilder::new(kind, start + gap).build();

        prop_assert!(limiter.admit(&first, &mut table, start));
        prop_assert!(!limiter.admit(&second, &mut table, start + gap));
        prop_assert_eq!(table.last_fired_at(kind), Some(start));
    }

    #[test]
    fn candidate_after_cooldown_is_admitted(
        kind in kind_strategy(),
        cooldown in 1u64..60_000,
        extra in 0u64..60_000,
    ) {
        let mut table = DebounceTable::new(&CooldownConfig { default_ms: cooldown, ..CooldownConfig::default() });
        let mut limiter = AlertRateLimiter::new();
        let later = cooldown + extra;

        prop_assert!(limiter.admit(&AlertBuilder::new(kind, 0).build(), &mut table, 0));
        prop_assert!(limiter.admit(&AlertBuilder::new(kind, later).build(), &mut table, later));
        prop_assert_eq!(table.last_fired_at(kind), Some(later));
    }

    #[test]
    fn dip_before_duration_restarts_window(
        sustain in 2u64..5_000,
        step in 1u64..200,
    ) {
        let config = MotionConfig { threshold: 2.5, sustain_ms: sustain };
        let mut debouncer = MotionDebouncer::new(config);

        // Shake until one ms short of the duration
        let mut t = 0;
        let mut x = 5.0;
        while t < sustain - 1 {
            prop_assert!(!debouncer.update(x, 0.0, t));
            x = if x > 0.0 { 0.0 } else { 5.0 };
            t = (t + step).min(sustain - 1);
        }
        prop_assert!(!debouncer.update(x, 0.0, sustain - 1));

        // Still sample resets the window
        prop_assert!(!debouncer.update(x, 0.0, sustain));
        prop_assert_eq!(debouncer.state().sustained_since, None);

        // Motion resumes: the full duration is needed again
        let restart = sustain + 1;
        let mut x = if x > 0.0 { 0.0 } else { 5.0 };
        prop_assert!(!debouncer.update(x, 0.0, restart));
        x = if x > 0.0 { 0.0 } else { 5.0 };
        prop_assert!(!debouncer.update(x, 0.0, restart + sustain - 1));
        x = if x > 0.0 { 0.0 } else { 5.0 };
        prop_assert!(debouncer.update(x, 0.0, restart + sustain));
    }

    #[test]
    fn tone_pattern_finishes_in_total_time(
        pulses in 1u8..6,
        on_ms in 1u32..500,
        off_ms in 0u32..500,
    ) {
        let pattern = BuzzerPattern::new(pulses, on_ms, off_ms);
        let mut scheduler = ToneScheduler::new();
        scheduler.start(pattern);

        let mut ons = 0;
        let mut now = 0;
        while now <= pattern.total_ms() {
            if scheduler.tick(now) == Some(true) {
                ons += 1;
            }
            if scheduler.is_idle() {
                break;
            }
            now += 1;
        }

        prop_assert!(scheduler.is_idle());
        prop_assert_eq!(now, pattern.total_ms());
        // Without a gap the pulses run together as one tone
        let expected_ons = if off_ms == 0 { 1 } else { u32::from(pulses) };
        prop_assert_eq!(ons, expected_ons);
    }
}
