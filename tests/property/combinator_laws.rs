// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Multi-Input Stages

use proptest::prelude::*;
use tickflow::frp::{combine_latest, merge, zip};
use tickflow::Subject;

/// Which input a push goes to, with its payload
fn pushes() -> impl Strategy<Value = Vec<(bool, u8)>> {
    prop::collection::vec((any::<bool>(), any::<u8>()), 0..60)
}

proptest! {
    /// Property: zip emits min(|A|, |B|) pairs, aligned by arrival index
    #[test]
    fn prop_zip_pairs_by_sequence(plan in pushes()) {
        let a: Subject<u8> = Subject::new();
        let b: Subject<u8> = Subject::new();
        let recorder = zip(&a.stream(), &b.stream()).record();

        let mut left = Vec::new();
        let mut right = Vec::new();
        for (t, (to_a, v)) in plan.iter().enumerate() {
            if *to_a {
                a.next(t as i64, *v);
                left.push(*v);
            } else {
                b.next(t as i64, *v);
                right.push(*v);
            }
        }

        let expected: Vec<(u8, u8)> = left.into_iter().zip(right).collect();
        prop_assert_eq!(recorder.values(), expected);
    }

    /// Property: combine_latest is silent until both inputs have emitted, then
    /// emits once per push with the other input's latest value
    #[test]
    fn prop_combine_latest_waits_for_both(plan in pushes()) {
        let a: Subject<u8> = Subject::new();
        let b: Subject<u8> = Subject::new();
        let recorder = combine_latest(&a.stream(), &b.stream()).record();

        let mut latest_a = None;
        let mut latest_b = None;
        let mut expected = Vec::new();
        for (t, (to_a, v)) in plan.iter().enumerate() {
            if *to_a {
                a.next(t as i64, *v);
                latest_a = Some(*v);
            } else {
                b.next(t as i64, *v);
                latest_b = Some(*v);
            }
            if let (Some(x), Some(y)) = (latest_a, latest_b) {
                expected.push((x, y));
            }
        }

        prop_assert_eq!(recorder.values(), expected);
    }

    /// Property: merge forwards every push exactly once, in push order
    #[test]
    fn prop_merge_is_push_order(plan in pushes()) {
        let a: Subject<(bool, u8)> = Subject::new();
        let b: Subject<(bool, u8)> = Subject::new();
        let recorder = merge(&a.stream(), &b.stream()).record();

        for (t, push) in plan.iter().enumerate() {
            if push.0 {
                a.next(t as i64, *push);
            } else {
                b.next(t as i64, *push);
            }
        }

        prop_assert_eq!(recorder.values(), plan);
    }
}
