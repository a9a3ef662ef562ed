//! Spring animation driver
//!
//! [`SpringAnimation`] owns a value/velocity/target triple and advances it once
//! per frame with its [`Spring`]. It registers with a [`FrameScheduler`] while
//! running, detects settling, and handles retargeting, reversal and repeats.
//!
//! ```text
//!             start            stop(immediately)
//! Inactive ─────────► Running ──────────────────► Ended
//!    ▲                 │  ▲ │
//!    └──── pause ──────┘  └─┘ set_target (retarget)
//! ```
//!
//! Callbacks are queued while the animation state is updated and delivered
//! once it is released, so a callback may read or drive the same animation
//! (chain a new target from `on_completion`, read `value()` from
//! `on_value_changed`). Notifications raised from inside a callback are
//! delivered after it returns, in order.
//!
//! [`FrameScheduler`]: crate::scheduler::FrameScheduler

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;

use recoil_core::{AnimatableVector, VectorQuantity};

use crate::config::AnimationConfig;
use crate::error::{Result, SpringError};
use crate::scheduler::{AnimationId, CancellationToken, FrameTick, SchedulerHandle, SharedTicker};
use crate::spring::Spring;

/// Lifecycle state of an animation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Not receiving ticks; the initial state and the state after `pause`
    #[default]
    Inactive,
    /// Registered with the scheduler and advancing every frame
    Running,
    /// Stopped, either explicitly or by settling
    Ended,
}

/// Where `stop` leaves the value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopPosition {
    /// The value the animation started from
    Start,
    /// Wherever the value currently is
    Current,
    /// The target
    End,
}

/// Delivered to the completion callback
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationEvent<V> {
    /// The animation stopped with the value at `at`
    Finished { at: V },
    /// The target changed while running
    Retargeted { from: V, to: V },
}

type ValueChangedCallback<V> = Box<dyn FnMut(V)>;
type CompletionCallback<V> = Box<dyn FnMut(AnimationEvent<V>)>;

/// Queued callback invocation
enum Notification<V> {
    ValueChanged(V),
    Completion(AnimationEvent<V>),
}

type SharedCore<V> = Rc<RefCell<AnimationCore<V>>>;

struct AnimationCore<V> {
    spring: Spring,
    value: AnimatableVector,
    velocity: AnimatableVector,
    target: AnimatableVector,
    from_value: AnimatableVector,
    from_velocity: AnimatableVector,
    running_time: f64,
    state: AnimationState,
    is_reversed: bool,
    repeats: bool,
    autoreverse: bool,
    auto_starts: bool,
    integralize_values: bool,
    delay: f64,
    pending_start: Option<CancellationToken>,
    scheduler: SchedulerHandle,
    registration: Option<AnimationId>,
    on_value_changed: Option<ValueChangedCallback<V>>,
    on_completion: Option<CompletionCallback<V>>,
    outbox: VecDeque<Notification<V>>,
    delivering: bool,
}

impl<V: VectorQuantity> AnimationCore<V> {
    fn cancel_pending_start(&mut self) {
        if let Some(token) = self.pending_start.take() {
            token.cancel();
        }
    }

    fn unregister(&mut self) {
        if let Some(id) = self.registration.take() {
            self.scheduler.unregister(id);
        }
    }

    fn emit_value_changed(&mut self) {
        let value = V::from_vector(&self.value);
        let value = if self.integralize_values {
            value.integralized()
        } else {
            value
        };
        self.outbox.push_back(Notification::ValueChanged(value));
    }

    fn emit_completion(&mut self, event: AnimationEvent<V>) {
        self.outbox.push_back(Notification::Completion(event));
    }

    /// Replace the target; returns true when the caller should auto-start
    fn retarget(&mut self, target: AnimatableVector) -> bool {
        let previous = mem::replace(&mut self.target, target);

        if self.state == AnimationState::Running {
            // Re-assigning the current target is not a retarget
            if previous == self.target {
                return false;
            }
            self.running_time = 0.0;
            tracing::debug!(
                from = ?previous.as_slice(),
                to = ?self.target.as_slice(),
                "animation retargeted"
            );
            let event = AnimationEvent::Retargeted {
                from: V::from_vector(&previous),
                to: V::from_vector(&self.target),
            };
            self.emit_completion(event);
            return false;
        }

        self.auto_starts && self.target != self.value
    }

    fn stop_immediately(&mut self, position: StopPosition) {
        self.unregister();
        self.state = AnimationState::Ended;

        match position {
            StopPosition::Start => self.value.assign(&self.from_value),
            StopPosition::End => self.value.assign(&self.target),
            StopPosition::Current => {}
        }

        self.emit_value_changed();
        self.running_time = 0.0;
        self.cancel_pending_start();
        self.velocity.clear();

        tracing::debug!(?position, value = ?self.value.as_slice(), "animation finished");
        let at = V::from_vector(&self.value);
        self.emit_completion(AnimationEvent::Finished { at });
    }

    /// One frame of the driver; callbacks are queued, not invoked
    fn advance(&mut self, dt: f64) {
        self.state = AnimationState::Running;

        let is_animated = self.spring.is_animated();
        if is_animated {
            let target = if self.is_reversed {
                &self.from_value
            } else {
                &self.target
            };
            self.spring
                .update_vector(&mut self.value, &mut self.velocity, target, dt);
        } else {
            self.value.assign(&self.target);
            self.velocity.clear();
        }

        self.running_time += dt;
        let finished = self.running_time >= self.spring.settling_duration() || !is_animated;

        if finished {
            if self.repeats && is_animated {
                if self.autoreverse {
                    self.is_reversed = !self.is_reversed;
                }
                if self.is_reversed {
                    self.value.assign(&self.target);
                    self.velocity.clear();
                } else {
                    self.value.assign(&self.from_value);
                    self.velocity.assign(&self.from_velocity);
                }
            } else {
                self.value.assign(&self.target);
            }
            self.running_time = 0.0;
        }

        tracing::trace!(
            value = ?self.value.as_slice(),
            running_time = self.running_time,
            finished,
            "animation tick"
        );
        self.emit_value_changed();

        if finished && (!self.repeats || !is_animated) {
            self.stop_immediately(StopPosition::Current);
        }
    }
}

/// Invoke queued callbacks with no borrow of the core held.
///
/// Re-entrant calls (from inside a callback) return immediately; the outer
/// loop picks up whatever they queued.
fn deliver_notifications<V: VectorQuantity>(core: &SharedCore<V>) {
    {
        let mut core = core.borrow_mut();
        if core.delivering {
            return;
        }
        core.delivering = true;
    }

    loop {
        let next = core.borrow_mut().outbox.pop_front();
        let Some(notification) = next else {
            break;
        };

        match notification {
            Notification::ValueChanged(value) => {
                let callback = core.borrow_mut().on_value_changed.take();
                if let Some(mut callback) = callback {
                    callback(value);
                    // Keep a callback installed from inside this one
                    let mut core = core.borrow_mut();
                    if core.on_value_changed.is_none() {
                        core.on_value_changed = Some(callback);
                    }
                }
            }
            Notification::Completion(event) => {
                let callback = core.borrow_mut().on_completion.take();
                if let Some(mut callback) = callback {
                    callback(event);
                    let mut core = core.borrow_mut();
                    if core.on_completion.is_none() {
                        core.on_completion = Some(callback);
                    }
                }
            }
        }
    }

    core.borrow_mut().delivering = false;
}

/// What the scheduler holds for a running animation
///
/// The core is borrowed only for the state update, so callbacks fired
/// afterwards can use the animation freely.
struct Ticker<V> {
    core: SharedCore<V>,
}

impl<V: VectorQuantity> FrameTick for Ticker<V> {
    fn tick(&mut self, dt: f64) {
        self.core.borrow_mut().advance(dt);
        deliver_notifications(&self.core);
    }
}

/// A spring-driven animation of a [`VectorQuantity`]
///
/// Cloning yields another handle to the same animation. While running, the
/// scheduler also holds a reference, so a running animation keeps going even
/// if every handle is dropped.
///
/// # Example
///
/// ```rust
/// use recoil_animation::{FrameScheduler, Spring, SpringAnimation, AnimationState};
///
/// let mut scheduler = FrameScheduler::new();
/// let animation = SpringAnimation::new(
///     scheduler.handle(),
///     Spring::snappy(0.3, 0.0),
///     0.0f64,
///     1.0,
///     0.0,
/// );
/// animation.start();
///
/// while animation.state() == AnimationState::Running {
///     scheduler.tick(1.0 / 60.0);
/// }
/// assert_eq!(animation.value(), 1.0);
/// ```
pub struct SpringAnimation<V: VectorQuantity + 'static> {
    core: SharedCore<V>,
}

impl<V: VectorQuantity + 'static> SpringAnimation<V> {
    pub fn new(scheduler: SchedulerHandle, spring: Spring, value: V, target: V, velocity: V) -> Self {
        let value = value.to_vector();
        let velocity = velocity.to_vector();
        let core = AnimationCore {
            spring,
            from_value: value.clone(),
            from_velocity: velocity.clone(),
            value,
            velocity,
            target: target.to_vector(),
            running_time: 0.0,
            state: AnimationState::Inactive,
            is_reversed: false,
            repeats: false,
            autoreverse: false,
            auto_starts: false,
            integralize_values: false,
            delay: 0.0,
            pending_start: None,
            scheduler,
            registration: None,
            on_value_changed: None,
            on_completion: None,
            outbox: VecDeque::new(),
            delivering: false,
        };
        Self {
            core: Rc::new(RefCell::new(core)),
        }
    }

    /// Create an animation with spring and playback options from `config`
    pub fn from_config(
        scheduler: SchedulerHandle,
        config: &AnimationConfig,
        value: V,
        target: V,
        velocity: V,
    ) -> Result<Self> {
        config.validate()?;
        let animation = Self::new(scheduler, config.spring.to_spring()?, value, target, velocity);
        {
            let mut core = animation.core.borrow_mut();
            core.delay = config.delay;
            core.repeats = config.repeats;
            core.autoreverse = config.autoreverse;
            core.auto_starts = config.auto_starts;
            core.integralize_values = config.integralize_values;
        }
        Ok(animation)
    }

    // ========================================================================
    // Builder options
    // ========================================================================

    pub fn with_repeats(self, repeats: bool) -> Self {
        self.set_repeats(repeats);
        self
    }

    pub fn with_autoreverse(self, autoreverse: bool) -> Self {
        self.set_autoreverse(autoreverse);
        self
    }

    pub fn with_auto_starts(self, auto_starts: bool) -> Self {
        self.set_auto_starts(auto_starts);
        self
    }

    pub fn with_integralize_values(self, integralize: bool) -> Self {
        self.set_integralize_values(integralize);
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start after the configured delay (0 unless set)
    pub fn start(&self) {
        let delay = self.core.borrow().delay;
        self.start_after(delay);
    }

    /// Start running after `delay` seconds.
    ///
    /// Does nothing if already running. A pending delayed start is cancelled
    /// and replaced.
    ///
    /// # Panics
    ///
    /// Panics if `delay` is negative or NaN.
    pub fn start_after(&self, delay: f64) {
        assert!(delay >= 0.0, "{}", SpringError::NegativeDelay(delay));

        let mut core = self.core.borrow_mut();
        if core.state == AnimationState::Running {
            return;
        }
        core.delay = delay;
        core.cancel_pending_start();

        if delay == 0.0 {
            drop(core);
            Self::begin_running(&self.core);
            return;
        }

        tracing::debug!(delay, "animation start scheduled");
        let weak = Rc::downgrade(&self.core);
        let token = core.scheduler.schedule_after(delay, move || {
            if let Some(core) = weak.upgrade() {
                Self::begin_running(&core);
            }
        });
        core.pending_start = Some(token);
    }

    fn begin_running(core: &SharedCore<V>) {
        let ticker: SharedTicker = Rc::new(RefCell::new(Ticker {
            core: Rc::clone(core),
        }));
        let mut core = core.borrow_mut();
        core.pending_start = None;
        if core.state == AnimationState::Running {
            return;
        }
        let Some(id) = core.scheduler.register(ticker) else {
            return;
        };
        core.registration = Some(id);
        core.state = AnimationState::Running;
        tracing::debug!(?id, "animation started");
    }

    /// Stop receiving ticks, keeping value, velocity and target
    pub fn pause(&self) {
        let mut core = self.core.borrow_mut();
        if core.state != AnimationState::Running {
            return;
        }
        core.cancel_pending_start();
        core.unregister();
        core.state = AnimationState::Inactive;
        tracing::debug!("animation paused");
    }

    /// Stop the animation.
    ///
    /// With `immediately`, the value snaps to `position`, velocity is zeroed
    /// and a [`AnimationEvent::Finished`] event fires. Otherwise the animation
    /// is retargeted to `position` and coasts there on the spring
    /// (`StopPosition::End` leaves the target unchanged).
    pub fn stop(&self, position: StopPosition, immediately: bool) {
        let auto_start = {
            let mut core = self.core.borrow_mut();
            core.cancel_pending_start();

            if immediately {
                core.stop_immediately(position);
                false
            } else {
                let target = match position {
                    StopPosition::Start => Some(core.from_value.clone()),
                    StopPosition::Current => Some(core.value.clone()),
                    StopPosition::End => None,
                };
                target.is_some_and(|target| core.retarget(target))
            }
        };

        deliver_notifications(&self.core);
        if auto_start {
            self.start_after(0.0);
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Set the target.
    ///
    /// While running, a target different from the current one retargets:
    /// running time resets and a [`AnimationEvent::Retargeted`] event fires;
    /// the spring continues from its current value and velocity. Re-assigning
    /// the current target changes nothing. Otherwise the animation starts only if
    /// auto-start is enabled and the target differs from the value.
    pub fn set_target(&self, target: V) {
        let auto_start = self.core.borrow_mut().retarget(target.to_vector());
        deliver_notifications(&self.core);
        if auto_start {
            self.start_after(0.0);
        }
    }

    /// Set the value; when not running this also becomes the start value
    pub fn set_value(&self, value: V) {
        let mut core = self.core.borrow_mut();
        core.value = value.to_vector();
        if core.state != AnimationState::Running {
            core.from_value = core.value.clone();
        }
    }

    /// Set the velocity; when not running this also becomes the start velocity
    pub fn set_velocity(&self, velocity: V) {
        let mut core = self.core.borrow_mut();
        core.velocity = velocity.to_vector();
        if core.state != AnimationState::Running {
            core.from_velocity = core.velocity.clone();
        }
    }

    /// Swap the spring; value and velocity carry over
    pub fn set_spring(&self, spring: Spring) {
        self.core.borrow_mut().spring = spring;
    }

    /// Default delay used by [`SpringAnimation::start`].
    ///
    /// # Panics
    ///
    /// Panics if `delay` is negative or NaN.
    pub fn set_delay(&self, delay: f64) {
        assert!(delay >= 0.0, "{}", SpringError::NegativeDelay(delay));
        self.core.borrow_mut().delay = delay;
    }

    pub fn set_repeats(&self, repeats: bool) {
        self.core.borrow_mut().repeats = repeats;
    }

    pub fn set_autoreverse(&self, autoreverse: bool) {
        self.core.borrow_mut().autoreverse = autoreverse;
    }

    pub fn set_auto_starts(&self, auto_starts: bool) {
        self.core.borrow_mut().auto_starts = auto_starts;
    }

    /// Round values passed to the value-changed callback to whole units
    pub fn set_integralize_values(&self, integralize: bool) {
        self.core.borrow_mut().integralize_values = integralize;
    }

    /// Called every tick with the current value, and once more on an
    /// immediate stop. The callback may use this animation.
    pub fn on_value_changed<F>(&self, callback: F)
    where
        F: FnMut(V) + 'static,
    {
        self.core.borrow_mut().on_value_changed = Some(Box::new(callback));
    }

    /// Called when the animation finishes or is retargeted
    pub fn on_completion<F>(&self, callback: F)
    where
        F: FnMut(AnimationEvent<V>) + 'static,
    {
        self.core.borrow_mut().on_completion = Some(Box::new(callback));
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn value(&self) -> V {
        V::from_vector(&self.core.borrow().value)
    }

    pub fn velocity(&self) -> V {
        V::from_vector(&self.core.borrow().velocity)
    }

    pub fn target(&self) -> V {
        V::from_vector(&self.core.borrow().target)
    }

    pub fn from_value(&self) -> V {
        V::from_vector(&self.core.borrow().from_value)
    }

    pub fn from_velocity(&self) -> V {
        V::from_vector(&self.core.borrow().from_velocity)
    }

    pub fn spring(&self) -> Spring {
        self.core.borrow().spring
    }

    pub fn state(&self) -> AnimationState {
        self.core.borrow().state
    }

    /// Seconds since the last start, settle or retarget
    pub fn running_time(&self) -> f64 {
        self.core.borrow().running_time
    }

    pub fn is_reversed(&self) -> bool {
        self.core.borrow().is_reversed
    }

    pub fn repeats(&self) -> bool {
        self.core.borrow().repeats
    }

    pub fn autoreverse(&self) -> bool {
        self.core.borrow().autoreverse
    }

    pub fn auto_starts(&self) -> bool {
        self.core.borrow().auto_starts
    }

    pub fn integralize_values(&self) -> bool {
        self.core.borrow().integralize_values
    }

    pub fn delay(&self) -> f64 {
        self.core.borrow().delay
    }

    /// True while a delayed start is waiting to fire
    pub fn has_pending_start(&self) -> bool {
        self.core
            .borrow()
            .pending_start
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn is_animated(&self) -> bool {
        self.core.borrow().spring.is_animated()
    }

    pub fn settling_duration(&self) -> f64 {
        self.core.borrow().spring.settling_duration()
    }
}

impl<V: VectorQuantity + 'static> Clone for SpringAnimation<V> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<V: VectorQuantity + 'static> fmt::Debug for SpringAnimation<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("SpringAnimation")
            .field("state", &core.state)
            .field("value", &core.value.as_slice())
            .field("velocity", &core.velocity.as_slice())
            .field("target", &core.target.as_slice())
            .field("running_time", &core.running_time)
            .field("spring", &core.spring)
            .finish()
    }
}
