// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Time-Driven Stages
//!
//! Throttle and debounce decisions depend only on occurrence times and the
//! configured interval.

use proptest::prelude::*;
use tickflow::{Clock, Subject, Time};

/// Strictly increasing occurrence times
fn increasing_times() -> impl Strategy<Value = Vec<Time>> {
    prop::collection::vec(1i64..8, 0..60).prop_map(|gaps| {
        let mut t = 0;
        gaps.into_iter()
            .map(|gap| {
                t += gap;
                t
            })
            .collect()
    })
}

proptest! {
    /// Property: accepted times are at least `interval` apart, and each one is
    /// the earliest candidate not within `interval` of the previous acceptance
    #[test]
    fn prop_throttle_first_spacing(times in increasing_times(), interval in 0i64..12) {
        let source: Subject<Time> = Subject::new();
        let recorder = source.stream().throttle_first(interval).record();

        for t in &times {
            source.next(*t, *t);
        }

        let accepted = recorder.values();
        for pair in accepted.windows(2) {
            prop_assert!(pair[1] - pair[0] >= interval);
        }

        let mut last: Option<Time> = None;
        let expected: Vec<Time> = times
            .iter()
            .copied()
            .filter(|t| {
                let open = last.map_or(true, |l| t - l >= interval);
                if open {
                    last = Some(*t);
                }
                open
            })
            .collect();
        prop_assert_eq!(accepted, expected);
    }

    /// Property: a burst within the interval yields exactly one value, the
    /// last one, at `last_time + interval`
    #[test]
    fn prop_debounce_burst_emits_last(
        start in 0i64..20,
        gaps in prop::collection::vec(0i64..4, 1..15),
        payloads in prop::collection::vec(any::<u16>(), 15),
    ) {
        let interval = 4;
        let clock = Clock::new(0);
        let source: Subject<u16> = Subject::new();
        let recorder = source.stream().debounce(interval, &clock).record();

        let mut t = start;
        for (i, gap) in gaps.iter().enumerate() {
            t += gap;
            clock.advance(t).unwrap();
            source.next(t, payloads[i]);
        }
        for extra in 1..=interval + 2 {
            clock.advance(t + extra).unwrap();
        }

        let last_payload = payloads[gaps.len() - 1];
        prop_assert_eq!(recorder.occurrences(), vec![(t + interval, last_payload)]);
    }

    /// Property: debounce emits each value whose successor came at least
    /// `interval` later, plus the final one
    #[test]
    fn prop_debounce_quiet_gaps(times in increasing_times(), interval in 1i64..6) {
        let clock = Clock::new(0);
        let source: Subject<Time> = Subject::new();
        let recorder = source.stream().debounce(interval, &clock).record();

        for t in &times {
            clock.advance(*t).unwrap();
            source.next(*t, *t);
        }
        if let Some(last) = times.last() {
            clock.advance(last + interval).unwrap();
        }

        let expected: Vec<(Time, Time)> = times
            .iter()
            .enumerate()
            .filter(|(i, t)| times.get(i + 1).map_or(true, |next| next - *t >= interval))
            .map(|(_, t)| (t + interval, *t))
            .collect();
        prop_assert_eq!(recorder.occurrences(), expected);
    }
}
