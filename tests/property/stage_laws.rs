// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Single-Input Stages
//!
//! Filter, map and scan must behave exactly like their iterator
//! counterparts applied to the pushed values, in push order.

use proptest::prelude::*;
use tickflow::{DiscreteEvent, InputSnapshot, InputSource, Key, Signal, Subject};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Keys a player might hold
fn key() -> impl Strategy<Value = Key> {
    prop_oneof![
        Just(Key::Char('W')),
        Just(Key::Char('A')),
        Just(Key::Char('S')),
        Just(Key::Char('D')),
        Just(Key::Space),
        Just(Key::Escape),
    ]
}

/// One held key (or none) per tick
fn key_samples() -> impl Strategy<Value = Vec<Option<Key>>> {
    prop::collection::vec(prop::option::of(key()), 0..60)
}

fn values() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-1000i32..1000, 0..80)
}

fn is_vertical(key: &Key) -> bool {
    matches!(key, Key::Char('W') | Key::Char('S'))
}

fn code(key: Key) -> u32 {
    match key {
        Key::Char(c) => c as u32,
        _ => 0,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: filter + map emits one mapped value per accepted key, in order
    #[test]
    fn prop_filter_map_preserves_order(samples in key_samples()) {
        let mut input = InputSource::new();
        let recorder = input.key_down().filter(is_vertical).map(code).record();

        for (tick, sample) in samples.iter().enumerate() {
            let snapshot = match sample {
                Some(key) => InputSnapshot::new().key_down(*key),
                None => InputSnapshot::new(),
            };
            input.sample(&snapshot, tick as i64);
        }

        let expected: Vec<u32> = samples
            .iter()
            .flatten()
            .copied()
            .filter(is_vertical)
            .map(code)
            .collect();
        prop_assert_eq!(recorder.values(), expected);
    }

    /// Property: scan emits exactly the left-fold prefix sequence
    #[test]
    fn prop_scan_is_prefix_fold(xs in values(), init in -50i64..50) {
        let source: Subject<i32> = Subject::new();
        let recorder = source
            .stream()
            .scan(init, |acc, x| acc * 3 % 1_000_003 + i64::from(x))
            .record();

        for (t, x) in xs.iter().enumerate() {
            source.next(t as i64, *x);
        }

        let mut acc = init;
        let expected: Vec<i64> = xs
            .iter()
            .map(|x| {
                acc = acc * 3 % 1_000_003 + i64::from(*x);
                acc
            })
            .collect();
        prop_assert_eq!(recorder.values(), expected);
    }

    /// Property: a live scan agrees with scanning the recorded trace
    #[test]
    fn prop_live_scan_matches_recorded_scan(xs in values()) {
        let source: Subject<i32> = Subject::new();
        let raw = source.stream().record();
        let live = source.stream().scan(0i64, |acc, x| acc + i64::from(x)).record();

        for (t, x) in xs.iter().enumerate() {
            source.next(t as i64, *x);
        }

        let recorded: DiscreteEvent<i64> = raw.events().map(i64::from).scan(0, |acc, x| acc + x);
        prop_assert_eq!(live.events(), recorded);
    }

    /// Property: history never exceeds its capacity and ends with the newest value
    #[test]
    fn prop_history_is_bounded(xs in values(), capacity in 1usize..10) {
        let source: Subject<i32> = Subject::new();
        let recorder = source.stream().history(capacity).record();

        for (t, x) in xs.iter().enumerate() {
            source.next(t as i64, *x);
        }

        for (i, window) in recorder.values().iter().enumerate() {
            prop_assert!(window.len() <= capacity);
            prop_assert_eq!(window.last(), Some(&xs[i]));
            let start = (i + 1).saturating_sub(capacity);
            prop_assert_eq!(window.as_slice(), &xs[start..=i]);
        }
    }

    /// Property: distinct_until_changed never forwards two equal values in a row
    #[test]
    fn prop_distinct_has_no_adjacent_duplicates(xs in prop::collection::vec(0u8..3, 0..50)) {
        let source: Subject<u8> = Subject::new();
        let recorder = source.stream().distinct_until_changed().record();

        for (t, x) in xs.iter().enumerate() {
            source.next(t as i64, *x);
        }

        let mut expected = xs.clone();
        expected.dedup();
        prop_assert_eq!(recorder.values(), expected);
    }
}
