//! Integration tests for springs + scheduler + animation driver
//!
//! These tests verify that:
//! - Animations driven by the scheduler settle on their targets
//! - Repeat and autoreverse snap to the opposite endpoint on each settle
//! - Several animations of different quantity types share one scheduler
//! - Animations built from TOML config behave like hand-built ones

use recoil_animation::{
    AnimationConfig, AnimationEvent, AnimationState, FrameScheduler, Spring, SpringAnimation,
};
use recoil_core::{Color, Point, Rect};
use std::cell::RefCell;
use std::rc::Rc;

const FRAME: f64 = 1.0 / 60.0;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Tick until `animation` completes its current approach (running time resets)
fn tick_until_settled<V: recoil_core::VectorQuantity>(
    scheduler: &mut FrameScheduler,
    animation: &SpringAnimation<V>,
) -> usize {
    let mut frames = 0;
    loop {
        scheduler.tick(FRAME);
        frames += 1;
        if animation.running_time() == 0.0 || frames > 10_000 {
            return frames;
        }
    }
}

#[test]
fn test_interactive_spring_settles_on_target() {
    init_tracing();
    let mut scheduler = FrameScheduler::new();
    let animation =
        SpringAnimation::new(scheduler.handle(), Spring::interactive(), 0.0f64, 100.0, 0.0);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    animation.on_completion(move |event| sink.borrow_mut().push(event));

    animation.start();
    let frames = tick_until_settled(&mut scheduler, &animation);

    let expected_frames = (animation.settling_duration() / FRAME).ceil() as usize;
    assert!(frames.abs_diff(expected_frames) <= 1);
    assert!((animation.value() - 100.0).abs() < 1e-2);
    assert_eq!(animation.velocity(), 0.0);
    assert_eq!(animation.state(), AnimationState::Ended);
    assert!(!scheduler.has_active_animations());
    assert_eq!(
        events.borrow().as_slice(),
        &[AnimationEvent::Finished { at: 100.0 }]
    );
}

#[test]
fn test_spring_approaches_target_before_settling() {
    let mut scheduler = FrameScheduler::new();
    let animation =
        SpringAnimation::new(scheduler.handle(), Spring::smooth(0.5, 0.0), 0.0f64, 10.0, 0.0);
    let samples = Rc::new(RefCell::new(Vec::new()));
    let sink = samples.clone();
    animation.on_value_changed(move |value| sink.borrow_mut().push(value));

    animation.start();
    tick_until_settled(&mut scheduler, &animation);

    let samples = samples.borrow();
    // Critically damped: monotonic approach, no overshoot
    assert!(samples.windows(2).all(|pair| pair[1] >= pair[0]));
    assert!(samples.iter().all(|value| *value <= 10.0));
    // The settling tick reports the snapped value twice; the sample before
    // those is the last integrated one
    let before_snap = samples[samples.len() - 3];
    assert!((before_snap - 10.0).abs() < 0.1);
}

#[test]
fn test_repeat_with_autoreverse_alternates_endpoints() {
    init_tracing();
    let mut scheduler = FrameScheduler::new();
    let animation =
        SpringAnimation::new(scheduler.handle(), Spring::snappy(0.25, 0.0), 0.0, 100.0, 0.0)
            .with_repeats(true)
            .with_autoreverse(true);

    animation.start();

    tick_until_settled(&mut scheduler, &animation);
    assert!(animation.is_reversed());
    assert_eq!(animation.value(), 100.0);
    assert_eq!(animation.velocity(), 0.0);
    assert_eq!(animation.state(), AnimationState::Running);

    // Heads back towards the start value
    scheduler.tick(FRAME);
    assert!(animation.value() < 100.0);

    tick_until_settled(&mut scheduler, &animation);
    assert!(!animation.is_reversed());
    assert_eq!(animation.value(), 0.0);
    assert_eq!(animation.state(), AnimationState::Running);

    animation.pause();
    assert!(!scheduler.has_active_animations());
}

#[test]
fn test_retarget_mid_flight_continues_from_current_motion() {
    let mut scheduler = FrameScheduler::new();
    let animation = SpringAnimation::new(
        scheduler.handle(),
        Spring::bouncy(0.5, 0.0),
        Point::ZERO,
        Point::new(200.0, 0.0),
        Point::ZERO,
    );
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    animation.on_completion(move |event| sink.borrow_mut().push(event));

    animation.start();
    for _ in 0..8 {
        scheduler.tick(FRAME);
    }
    let velocity = animation.velocity();
    assert!(velocity.x > 0.0);

    animation.set_target(Point::new(-50.0, 80.0));
    assert_eq!(animation.velocity(), velocity);

    tick_until_settled(&mut scheduler, &animation);
    assert_eq!(animation.value(), Point::new(-50.0, 80.0));
    assert_eq!(
        events.borrow().as_slice(),
        &[
            AnimationEvent::Retargeted {
                from: Point::new(200.0, 0.0),
                to: Point::new(-50.0, 80.0),
            },
            AnimationEvent::Finished {
                at: Point::new(-50.0, 80.0)
            },
        ]
    );
}

#[test]
fn test_mixed_quantities_share_a_scheduler() {
    let mut scheduler = FrameScheduler::new();
    let frame = SpringAnimation::new(
        scheduler.handle(),
        Spring::snappy(0.3, 0.0),
        Rect::new(0.0, 0.0, 100.0, 100.0),
        Rect::new(40.0, 40.0, 320.0, 240.0),
        Rect::ZERO,
    );
    let tint = SpringAnimation::new(
        scheduler.handle(),
        Spring::smooth(0.6, 0.0),
        Color::BLACK,
        Color::from_hex(0x3366FF),
        Color::TRANSPARENT,
    );

    frame.start();
    tint.start();
    assert_eq!(scheduler.active_count(), 2);

    let mut frames = 0;
    while scheduler.has_active_animations() && frames < 1_000 {
        scheduler.tick(FRAME);
        frames += 1;
    }

    assert_eq!(frame.value(), Rect::new(40.0, 40.0, 320.0, 240.0));
    assert_eq!(tint.value(), Color::from_hex(0x3366FF));
    // The faster spring finished first
    assert!(frame.settling_duration() < tint.settling_duration());
}

#[test]
fn test_running_animation_outlives_its_handle() {
    let mut scheduler = FrameScheduler::new();
    let finished = Rc::new(RefCell::new(None));
    {
        let animation =
            SpringAnimation::new(scheduler.handle(), Spring::snappy(0.2, 0.0), 0.0, 1.0, 0.0);
        let sink = finished.clone();
        animation.on_completion(move |event| {
            if let AnimationEvent::Finished { at } = event {
                *sink.borrow_mut() = Some(at);
            }
        });
        animation.start();
    }

    for _ in 0..120 {
        scheduler.tick(FRAME);
    }
    assert_eq!(*finished.borrow(), Some(1.0));
    assert!(!scheduler.has_active_animations());
}

#[test]
fn test_delayed_start_from_config() {
    init_tracing();
    let config = AnimationConfig::from_toml_str(
        r#"
        delay = 0.1
        integralize_values = true

        [spring]
        duration = 0.3
        bounce = 0.15
        "#,
    )
    .unwrap();

    let mut scheduler = FrameScheduler::new();
    let animation = SpringAnimation::from_config(
        scheduler.handle(),
        &config,
        Point::new(0.0, 0.0),
        Point::new(120.0, 60.0),
        Point::ZERO,
    )
    .unwrap();
    assert_eq!(animation.spring(), Spring::with_duration(0.3, 0.15));
    assert!(animation.integralize_values());

    animation.start();
    assert_eq!(animation.state(), AnimationState::Inactive);
    assert!(animation.has_pending_start());

    scheduler.tick(0.05);
    assert_eq!(animation.state(), AnimationState::Inactive);
    scheduler.tick(0.05);
    assert_eq!(animation.state(), AnimationState::Running);
    assert_eq!(animation.value(), Point::ZERO);

    scheduler.tick(FRAME);
    assert!(animation.value().x > 0.0);
}

#[test]
fn test_dropping_scheduler_leaves_animation_inert() {
    let scheduler = FrameScheduler::new();
    let animation =
        SpringAnimation::new(scheduler.handle(), Spring::interactive(), 0.0, 1.0, 0.0);
    drop(scheduler);

    animation.start_after(0.5);
    assert!(!animation.has_pending_start());
    assert_eq!(animation.state(), AnimationState::Inactive);

    animation.start_after(0.0);
    assert_eq!(animation.state(), AnimationState::Inactive);
}
