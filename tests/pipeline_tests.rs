// Copyright (c) 2025 - Cowboy AI, Inc.
//! End-to-end pipeline tests
//!
//! Drive complete stage graphs through `Pipeline::tick` and the scripted
//! backend, the way an application loop would.

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use tickflow::frp::{combine_latest, with_latest_from, zip};
use tickflow::sim::{player_positions, GameState, Player, Scoreboard};
use tickflow::{
    reset_unhandled_error_hook, set_unhandled_error_hook, CompositeSubscription, InputSnapshot, Key,
    MouseButton, Observer, Pipeline, PipelineConfig, PipelineError, PipelineResult, ScriptedInput,
    Signal, Store, Subject, TimeUnit, Vec2,
};

#[test]
fn test_wwd_movement_end_to_end() {
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let positions = player_positions(&pipeline.input().key_down(), &movement_config()).record();

    for (tick, snapshot) in wwd_snapshots().iter().enumerate() {
        pipeline.tick(snapshot, tick as i64).unwrap();
    }

    assert_eq!(
        positions.occurrences(),
        vec![
            (0, Vec2::new(100.0, 100.0 - SPEED)),
            (1, Vec2::new(100.0, 100.0 - 2.0 * SPEED)),
            (2, Vec2::new(100.0 + SPEED, 100.0 - 2.0 * SPEED)),
        ]
    );
}

#[test]
fn test_wwd_trace_is_reproducible() {
    let run = || {
        let config = PipelineConfig::default();
        let mut backend = ScriptedInput::new(script(wwd_snapshots()), &config).unwrap();
        let mut pipeline = Pipeline::new(config);
        let player = Player::attach(pipeline.input(), &movement_config());
        let trace = player.positions().record();
        let store = Store::new(());
        let mut renderer = |_: &()| -> PipelineResult<()> { Ok(()) };
        pipeline.run(&mut backend, &store, &mut renderer).unwrap();
        (trace.occurrences(), player.position())
    };

    let (first, final_first) = run();
    let (second, final_second) = run();

    assert_eq!(first, second);
    assert_eq!(final_first, Vec2::new(100.0 + SPEED, 100.0 - 2.0 * SPEED));
    assert_eq!(final_first, final_second);
}

#[test]
fn test_held_key_throttled_in_millis() {
    let config = PipelineConfig {
        time_unit: TimeUnit::Millis,
        frame_millis: 16,
        ..PipelineConfig::default()
    };
    let snapshots = vec![InputSnapshot::new().key_down(Key::char('d')); 6];
    let mut backend = ScriptedInput::new(script(snapshots), &config).unwrap();
    let mut pipeline = Pipeline::new(config);
    let movement = tickflow::MovementConfig {
        throttle: 40,
        ..movement_config()
    };
    let player = Player::attach(pipeline.input(), &movement);
    let trace = player.positions().record();

    let store = Store::new(());
    let mut renderer = |_: &()| -> PipelineResult<()> { Ok(()) };
    pipeline.run(&mut backend, &store, &mut renderer).unwrap();

    // Frames at 0, 16, 32, 48, 64, 80; accepted at 0, 48
    let times: Vec<i64> = trace.occurrences().into_iter().map(|(t, _)| t).collect();
    assert_eq!(times, vec![0, 48]);
}

#[test]
fn test_scoreboard_renders_state_each_tick() {
    let config = PipelineConfig::default();
    let mut backend = ScriptedInput::new(script(space_presses(25, 2)), &config).unwrap();
    let mut pipeline = Pipeline::new(config.clone());
    let board = Scoreboard::attach(pipeline.input(), &config);
    let levels = board.levels().record();

    let store = Store::new(GameState::default());
    store.bind(&board.state_behavior().changes(), |state, next| *state = next);

    let mut rendered = Vec::new();
    let mut renderer = |state: &GameState| -> PipelineResult<()> {
        rendered.push(state.score);
        Ok(())
    };
    let summary = pipeline.run(&mut backend, &store, &mut renderer).unwrap();

    // 13 presses on frames 0, 2, ..., 24
    assert_eq!(summary.ticks, 25);
    assert_eq!(rendered.len(), 25);
    assert_eq!(rendered[0], 10);
    assert_eq!(rendered[1], 10);
    assert_eq!(store.read().score, 130);
    assert_eq!(store.read().level, 2);
    assert_eq!(levels.occurrences(), vec![(18, 2)]);
}

#[test]
fn test_control_stream_disposes_subscriptions() {
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let quit = pipeline.input().key_pressed().filter(|k| *k == Key::Escape);

    let moves = Rc::new(RefCell::new(0));
    let group = CompositeSubscription::new();
    let counter = moves.clone();
    group.add(pipeline.input().key_down().subscribe(move |_| *counter.borrow_mut() += 1));
    group.dispose_on(&quit);

    let held = InputSnapshot::new().key_down(Key::char('w'));
    pipeline.tick(&held, 0).unwrap();
    pipeline
        .tick(&held.clone().key_pressed(Key::Escape), 1)
        .unwrap();
    pipeline.tick(&held, 2).unwrap();

    // Tick 1 delivers its key-down events before the escape press
    assert_eq!(*moves.borrow(), 3);
    assert_eq!(group.active_count(), 0);
    assert_eq!(quit.subscriber_count(), 0);
    assert!(!quit.is_connected());
}

#[test]
fn test_take_until_stops_forwarding_on_signal_tick() {
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let stop = pipeline.input().key_pressed().filter(|k| *k == Key::Escape);
    let clicks = pipeline.input().mouse_clicked().take_until(&stop).record();

    let click = InputSnapshot::new().mouse_pressed(MouseButton::Left);
    pipeline.tick(&click, 0).unwrap();
    pipeline
        .tick(&click.clone().key_pressed(Key::Escape), 1)
        .unwrap();
    pipeline.tick(&click, 2).unwrap();

    // Key events precede mouse events within a tick
    assert_eq!(clicks.occurrences().len(), 1);
    assert!(clicks.is_completed());
}

#[test]
fn test_transform_failure_goes_to_error_callback() {
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let codes = pipeline.input().key_pressed().try_map(|key| match key {
        Key::Char(c) => Ok(c),
        other => Err(format!("no character for {}", other)),
    });

    let values = Rc::new(RefCell::new(Vec::new()));
    let errors = Rc::new(RefCell::new(Vec::new()));
    let (v, e) = (values.clone(), errors.clone());
    codes.subscribe_with(
        Observer::new(move |c| v.borrow_mut().push(c))
            .on_error(move |err| e.borrow_mut().push(err)),
    );

    pipeline
        .tick(&InputSnapshot::new().key_pressed(Key::char('a')), 0)
        .unwrap();
    pipeline
        .tick(&InputSnapshot::new().key_pressed(Key::Space), 1)
        .unwrap();
    pipeline
        .tick(&InputSnapshot::new().key_pressed(Key::char('b')), 2)
        .unwrap();

    assert_eq!(*values.borrow(), vec!['A', 'B']);
    assert_eq!(errors.borrow().len(), 1);
    assert!(matches!(
        errors.borrow()[0],
        PipelineError::TransformFailed { stage: "try_map", .. }
    ));
}

#[test]
fn test_panicking_map_reaches_unhandled_hook() {
    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = reported.clone();
    set_unhandled_error_hook(move |err| sink.borrow_mut().push(err.clone()));

    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let halves = Rc::new(RefCell::new(Vec::new()));
    let out = halves.clone();
    pipeline
        .input()
        .key_pressed()
        .map(|key| match key {
            Key::Space => panic!("space has no half"),
            _ => 1,
        })
        .subscribe(move |h| out.borrow_mut().push(h));

    pipeline
        .tick(&InputSnapshot::new().key_pressed(Key::Space), 0)
        .unwrap();
    pipeline
        .tick(&InputSnapshot::new().key_pressed(Key::Enter), 1)
        .unwrap();
    reset_unhandled_error_hook();

    assert_eq!(*halves.borrow(), vec![1]);
    assert_eq!(reported.borrow().len(), 1);
    assert!(matches!(
        reported.borrow()[0],
        PipelineError::TransformPanicked { .. }
    ));
}

#[test]
fn test_debounce_driven_by_ticks() {
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let settled = pipeline
        .input()
        .mouse_moved()
        .map(|m| m.position)
        .debounce(3, pipeline.clock())
        .record();

    for (tick, snapshot) in drag_snapshots().iter().enumerate() {
        pipeline.tick(snapshot, tick as i64).unwrap();
    }
    for tick in 4..10 {
        pipeline.tick(&InputSnapshot::new().mouse_at(20.0, 14.0), tick).unwrap();
    }

    // Last move at tick 3, so the value settles at 3 + 3
    assert_eq!(settled.occurrences(), vec![(6, Vec2::new(20.0, 14.0))]);
}

#[test]
fn test_combinators_over_input() {
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let input = pipeline.input();
    let positions = input.mouse_moved().map(|m| m.position);
    let keys = input.key_pressed();

    let latest = combine_latest(&keys, &positions).record();
    let clicks_at_key = with_latest_from(&input.mouse_clicked(), &keys).record();
    let paired = zip(&keys, &input.mouse_clicked()).record();

    let frames = vec![
        InputSnapshot::new().mouse_at(0.0, 0.0),
        InputSnapshot::new().mouse_at(1.0, 0.0),
        InputSnapshot::new()
            .mouse_at(1.0, 0.0)
            .key_pressed(Key::char('q'))
            .mouse_pressed(MouseButton::Left),
        InputSnapshot::new().mouse_at(2.0, 0.0),
        InputSnapshot::new()
            .mouse_at(2.0, 0.0)
            .mouse_pressed(MouseButton::Right),
    ];
    for (tick, snapshot) in frames.iter().enumerate() {
        pipeline.tick(snapshot, tick as i64).unwrap();
    }

    assert_eq!(
        latest.values(),
        vec![
            (Key::Char('Q'), Vec2::new(1.0, 0.0)),
            (Key::Char('Q'), Vec2::new(2.0, 0.0)),
        ]
    );
    assert_eq!(
        clicks_at_key
            .values()
            .into_iter()
            .map(|(click, key)| (click.button, key))
            .collect::<Vec<_>>(),
        vec![
            (MouseButton::Left, Key::Char('Q')),
            (MouseButton::Right, Key::Char('Q')),
        ]
    );
    assert_eq!(paired.values().len(), 1);
}

#[test]
fn test_merge_keeps_push_order() {
    let keys: Subject<&str> = Subject::new();
    let mouse: Subject<&str> = Subject::new();
    let merged = keys.stream().merge(&mouse.stream()).record();

    keys.next(0, "k0");
    mouse.next(0, "m0");
    mouse.next(1, "m1");
    keys.next(1, "k1");

    assert_eq!(merged.values(), vec!["k0", "m0", "m1", "k1"]);
}
