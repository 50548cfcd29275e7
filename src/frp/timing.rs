// Copyright (c) 2025 - Cowboy AI, Inc.
//! Time-Driven Stages
//!
//! Throttling, debouncing and buffering depend on elapsed time, not only on
//! the arrival of values. The pipeline owns a [`Clock`] which the tick loop
//! advances once per frame with the externally supplied `now`; time-driven
//! stages subscribe to its tick stream.
//!
//! All decisions are pure functions of occurrence times and the configured
//! interval. Nothing here reads a wall clock.
//!
//! ```text
//! values:    a  b c        d
//! ticks:   │ │ │ │ │ │ │ │ │ │ │
//! throttle:  a             d          (first wins, rest dropped)
//! debounce:          c           d    (last wins, after a quiet interval)
//! ```

use super::stream::{Emitter, Notification, Stream};
use super::subject::Subject;
use super::Time;
use crate::errors::{PipelineError, PipelineResult};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{trace, warn};

/// Most periods [`Clock::interval`] emits for a single advance
pub const MAX_INTERVAL_CATCH_UP: u64 = 1024;

/// Logical clock driving time-sensitive stages
///
/// Cloning shares the clock.
#[derive(Clone, Debug)]
pub struct Clock {
    now: Rc<Cell<Time>>,
    ticks: Subject<Time>,
}

impl Clock {
    /// Create a clock starting at `start`
    pub fn new(start: Time) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
            ticks: Subject::named("clock"),
        }
    }

    /// Current logical time
    pub fn now(&self) -> Time {
        self.now.get()
    }

    /// Move the clock to `now` and notify every time-driven stage
    ///
    /// Advancing to the current time again is allowed and re-runs the tick.
    pub fn advance(&self, now: Time) -> PipelineResult<()> {
        let current = self.now.get();
        if now < current {
            return Err(PipelineError::ClockRegression {
                current,
                requested: now,
            });
        }
        self.now.set(now);
        trace!(now, "Clock advanced");
        self.ticks.next(now, now);
        Ok(())
    }

    /// Stream of tick times, one per `advance`
    pub fn ticks(&self) -> Stream<Time> {
        self.ticks.stream()
    }

    /// Emit a running count every `period` units of time
    ///
    /// Counting starts at the time the stage connects. If one advance crosses
    /// several periods, one value is emitted per period, each stamped with
    /// its period boundary. At most [`MAX_INTERVAL_CATCH_UP`] values are
    /// emitted per advance: older periods are skipped, but still counted.
    pub fn interval(&self, period: Time) -> Stream<u64> {
        let period = period.max(1);
        let ticks = self.ticks();
        let now = self.now.clone();
        Stream::from_connector("interval", move |out| {
            let out = out.clone();
            let mut next_due = now.get() + period;
            let mut count: u64 = 0;
            vec![ticks.subscribe_raw(move |notification| {
                if let Notification::Next(now, _) = notification {
                    if *now < next_due {
                        return;
                    }
                    let elapsed = ((*now - next_due) / period) as u64 + 1;
                    if elapsed > MAX_INTERVAL_CATCH_UP {
                        let skipped = elapsed - MAX_INTERVAL_CATCH_UP;
                        warn!(period, skipped, "Interval skipped periods after a large clock jump");
                        count += skipped;
                        next_due += skipped as Time * period;
                    }
                    while *now >= next_due {
                        out.next(next_due, count);
                        count += 1;
                        next_due += period;
                    }
                }
            })]
        })
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Accept a value only if none was accepted within the last `interval`
    ///
    /// Rejected values are dropped: no queue, no trailing emission.
    pub fn throttle_first(&self, interval: Time) -> Stream<T> {
        let interval = interval.max(0);
        self.stage("throttle_first", move || {
            let mut last_accepted: Option<Time> = None;
            move |out: &Emitter<T>, time: Time, value: &T| {
                let open = last_accepted.map_or(true, |last| time - last >= interval);
                if open {
                    last_accepted = Some(time);
                    out.next(time, value.clone());
                }
            }
        })
    }

    /// Emit the latest value once `interval` has passed without a newer one
    ///
    /// Each value replaces the pending one and restarts the wait. The
    /// emission is stamped `last_value_time + interval` and happens on the
    /// first clock tick at or after that time. On completion a pending value
    /// is flushed first.
    pub fn debounce(&self, interval: Time, clock: &Clock) -> Stream<T> {
        let interval = interval.max(0);
        let source = self.clone();
        let ticks = clock.ticks();
        Stream::from_connector("debounce", move |out| {
            let pending: Rc<RefCell<Option<(Time, T)>>> = Rc::new(RefCell::new(None));

            let on_value = {
                let pending = pending.clone();
                let out = out.clone();
                source.subscribe_raw(move |notification| match notification {
                    Notification::Next(time, value) => {
                        // A deadline that already passed without a tick still fires
                        let due = {
                            let mut slot = pending.borrow_mut();
                            let due = slot.take().filter(|(deadline, _)| *deadline <= *time);
                            *slot = Some((time + interval, value.clone()));
                            due
                        };
                        if let Some((deadline, value)) = due {
                            out.next(deadline, value);
                        }
                    }
                    Notification::Error(e) => out.error(e.clone()),
                    Notification::Completed => {
                        let due = pending.borrow_mut().take();
                        if let Some((deadline, value)) = due {
                            out.next(deadline, value);
                        }
                        out.complete();
                    }
                })
            };

            let on_tick = {
                let out = out.clone();
                ticks.subscribe_raw(move |notification| {
                    if let Notification::Next(now, _) = notification {
                        let due = {
                            let mut slot = pending.borrow_mut();
                            let ready = matches!(slot.as_ref(), Some((deadline, _)) if deadline <= now);
                            if ready {
                                slot.take()
                            } else {
                                None
                            }
                        };
                        if let Some((deadline, value)) = due {
                            out.next(deadline, value);
                        }
                    }
                })
            };

            vec![on_value, on_tick]
        })
    }

    /// Collect values into batches, one batch per elapsed `interval`
    ///
    /// Windows are aligned to the time the stage connected. A batch is
    /// emitted on the tick that closes its window, stamped with that tick's
    /// time. Empty windows emit nothing. On completion the open batch is
    /// flushed.
    pub fn buffer_time(&self, interval: Time, clock: &Clock) -> Stream<Vec<T>> {
        let interval = interval.max(1);
        let source = self.clone();
        let ticks = clock.ticks();
        let now = clock.now.clone();
        Stream::from_connector("buffer_time", move |out| {
            let batch: Rc<RefCell<Vec<T>>> = Rc::new(RefCell::new(Vec::new()));
            let mut window_start = now.get();

            let on_value = {
                let batch = batch.clone();
                let out = out.clone();
                let now = now.clone();
                source.subscribe_raw(move |notification| match notification {
                    Notification::Next(_, value) => batch.borrow_mut().push(value.clone()),
                    Notification::Error(e) => out.error(e.clone()),
                    Notification::Completed => {
                        let rest = std::mem::take(&mut *batch.borrow_mut());
                        if !rest.is_empty() {
                            out.next(now.get(), rest);
                        }
                        out.complete();
                    }
                })
            };

            let on_tick = {
                let out = out.clone();
                ticks.subscribe_raw(move |notification| {
                    if let Notification::Next(now, _) = notification {
                        let elapsed = now - window_start;
                        if elapsed < interval {
                            return;
                        }
                        window_start += (elapsed / interval) * interval;
                        let full = std::mem::take(&mut *batch.borrow_mut());
                        if !full.is_empty() {
                            out.next(*now, full);
                        }
                    }
                })
            };

            vec![on_value, on_tick]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_clock_rejects_regression() {
        let clock = Clock::new(10);
        assert!(clock.advance(12).is_ok());
        assert_eq!(
            clock.advance(11),
            Err(PipelineError::ClockRegression {
                current: 12,
                requested: 11
            })
        );
        assert_eq!(clock.now(), 12);
    }

    #[test_case(&[0, 1, 2, 3], 1, &[0, 1, 2, 3] ; "every tick passes at interval one")]
    #[test_case(&[0, 1, 2, 3, 4], 2, &[0, 2, 4] ; "every other tick")]
    #[test_case(&[0, 5, 6, 9, 10, 16], 5, &[0, 5, 10, 16] ; "earliest candidate after the gap")]
    #[test_case(&[3, 3, 3], 1, &[3] ; "same tick duplicates dropped")]
    fn test_throttle_first(times: &[Time], interval: Time, expected: &[Time]) {
        let source: Subject<Time> = Subject::new();
        let recorder = source.stream().throttle_first(interval).record();

        for &t in times {
            source.next(t, t);
        }

        assert_eq!(recorder.values(), expected.to_vec());
    }

    #[test]
    fn test_debounce_emits_last_of_burst() {
        let clock = Clock::new(0);
        let source: Subject<char> = Subject::new();
        let recorder = source.stream().debounce(5, &clock).record();

        for (t, c) in [(0, 'a'), (2, 'b'), (4, 'c')] {
            clock.advance(t).unwrap();
            source.next(t, c);
        }
        for t in 5..12 {
            clock.advance(t).unwrap();
        }

        assert_eq!(recorder.occurrences(), vec![(9, 'c')]);
    }

    #[test]
    fn test_debounce_separate_bursts() {
        let clock = Clock::new(0);
        let source: Subject<u8> = Subject::new();
        let recorder = source.stream().debounce(2, &clock).record();

        source.next(0, 1);
        clock.advance(1).unwrap();
        clock.advance(2).unwrap();
        source.next(2, 2);
        clock.advance(3).unwrap();
        clock.advance(4).unwrap();

        assert_eq!(recorder.occurrences(), vec![(2, 1), (4, 2)]);
    }

    #[test]
    fn test_debounce_flushes_on_complete() {
        let clock = Clock::new(0);
        let source: Subject<u8> = Subject::new();
        let recorder = source.stream().debounce(10, &clock).record();

        source.next(1, 7);
        source.complete();

        assert_eq!(recorder.occurrences(), vec![(11, 7)]);
        assert!(recorder.is_completed());
    }

    #[test]
    fn test_buffer_time_batches_per_window() {
        let clock = Clock::new(0);
        let moves: Subject<i32> = Subject::new();
        let recorder = moves.stream().buffer_time(3, &clock).record();

        for t in 0..7 {
            clock.advance(t).unwrap();
            if t != 4 && t != 5 {
                moves.next(t, t as i32);
            }
        }

        // Window [0,3) closes on tick 3 before the value at 3 arrives
        assert_eq!(
            recorder.occurrences(),
            vec![(3, vec![0, 1, 2]), (6, vec![3])]
        );
    }

    #[test]
    fn test_interval_counts_periods() {
        let clock = Clock::new(0);
        let recorder = clock.interval(2).record();

        for t in [1, 2, 3, 7] {
            clock.advance(t).unwrap();
        }

        assert_eq!(recorder.occurrences(), vec![(2, 0), (4, 1), (6, 2)]);
    }

    #[test]
    fn test_interval_catch_up_is_bounded() {
        let clock = Clock::new(0);
        let recorder = clock.interval(1).record();

        clock.advance(10_000).unwrap();
        clock.advance(10_002).unwrap();

        let occurrences = recorder.occurrences();
        let cap = MAX_INTERVAL_CATCH_UP as usize;
        assert_eq!(occurrences.len(), cap + 2);
        assert_eq!(occurrences[0], (10_000 - cap as i64 + 1, 10_000 - cap as u64));
        assert_eq!(occurrences[cap - 1], (10_000, 9_999));
        assert_eq!(occurrences[cap + 1], (10_002, 10_001));
    }
}
