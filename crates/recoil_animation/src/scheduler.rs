//! Frame scheduler
//!
//! Owns the set of running animations and delivers one tick per frame to each
//! of them. Animations hold a weak [`SchedulerHandle`] and register themselves
//! when they start and unregister when they stop, so idle animations cost
//! nothing per frame.
//!
//! The scheduler also runs delayed tasks (used for `start(after_delay)`); each
//! one is cancellable through the [`CancellationToken`] returned when it is
//! scheduled.
//!
//! Everything here is single-threaded: the scheduler, its handles and the
//! animations it drives must live on the thread that ticks them.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Registration of a running animation
    pub struct AnimationId;
    /// A pending delayed task
    pub struct TaskId;
}

/// Per-frame contract between the scheduler and a running animation
pub trait FrameTick {
    /// Advance by `dt` seconds of wall-clock time
    fn tick(&mut self, dt: f64);
}

/// A registered animation, shared between its owner and the scheduler
pub type SharedTicker = Rc<RefCell<dyn FrameTick>>;

/// Handle for cancelling a delayed task
///
/// Cancelling is synchronous and idempotent; cancelling a task that already ran
/// or was already cancelled does nothing.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

struct DelayedTask {
    remaining: f64,
    token: CancellationToken,
    task: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct SchedulerInner {
    animations: SlotMap<AnimationId, SharedTicker>,
    tasks: SlotMap<TaskId, DelayedTask>,
}

/// The scheduler that ticks all running animations
pub struct FrameScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
    last_frame: Option<Instant>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner::default())),
            last_frame: None,
        }
    }

    /// A weak handle animations use to register themselves
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver one frame of `dt` seconds.
    ///
    /// Every animation registered when the frame begins is ticked once, unless
    /// it unregisters earlier in the same frame. Delayed tasks are advanced
    /// afterwards, so an animation started by one gets its first tick on the
    /// next frame.
    pub fn tick(&mut self, dt: f64) {
        let tickers: SmallVec<[(AnimationId, SharedTicker); 8]> = self
            .inner
            .borrow()
            .animations
            .iter()
            .map(|(id, ticker)| (id, Rc::clone(ticker)))
            .collect();

        for (id, ticker) in tickers {
            if !self.inner.borrow().animations.contains_key(id) {
                continue;
            }
            match ticker.try_borrow_mut() {
                Ok(mut ticker) => ticker.tick(dt),
                Err(_) => tracing::warn!(?id, "animation borrowed during frame tick, skipping"),
            }
        }

        self.run_due_tasks(dt);
    }

    /// Deliver one frame measured from the previous `tick_now` call.
    ///
    /// The first call only records the timestamp and delivers `0`.
    pub fn tick_now(&mut self) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| (now - last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.tick(dt);
    }

    fn run_due_tasks(&mut self, dt: f64) {
        let due: SmallVec<[DelayedTask; 4]> = {
            let mut inner = self.inner.borrow_mut();
            inner.tasks.retain(|_, task| !task.token.is_cancelled());

            let mut due_ids: SmallVec<[TaskId; 4]> = SmallVec::new();
            for (id, task) in inner.tasks.iter_mut() {
                task.remaining -= dt;
                if task.remaining <= 0.0 {
                    due_ids.push(id);
                }
            }
            due_ids
                .into_iter()
                .filter_map(|id| inner.tasks.remove(id))
                .collect()
        };

        for task in due {
            // An earlier task in this batch may have cancelled this one
            if !task.token.is_cancelled() {
                (task.task)();
            }
        }
    }

    /// Check if any animations are registered
    pub fn has_active_animations(&self) -> bool {
        !self.inner.borrow().animations.is_empty()
    }

    /// Number of registered animations
    pub fn active_count(&self) -> usize {
        self.inner.borrow().animations.len()
    }

    /// Number of delayed tasks that have not run or been cancelled
    pub fn pending_count(&self) -> usize {
        self.inner
            .borrow()
            .tasks
            .values()
            .filter(|task| !task.token.is_cancelled())
            .count()
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak reference to a [`FrameScheduler`]
///
/// Operations on a handle whose scheduler has been dropped do nothing.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Start delivering frame ticks to `ticker`
    pub fn register(&self, ticker: SharedTicker) -> Option<AnimationId> {
        let Some(inner) = self.inner.upgrade() else {
            tracing::warn!("animation registered with a dropped scheduler");
            return None;
        };
        let id = inner.borrow_mut().animations.insert(ticker);
        tracing::trace!(?id, "animation registered");
        Some(id)
    }

    /// Stop delivering frame ticks; returns whether `id` was registered
    pub fn unregister(&self, id: AnimationId) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let removed = inner.borrow_mut().animations.remove(id).is_some();
        if removed {
            tracing::trace!(?id, "animation unregistered");
        }
        removed
    }

    pub fn is_registered(&self, id: AnimationId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().animations.contains_key(id))
    }

    /// Run `task` once at least `delay` seconds of ticks have elapsed.
    ///
    /// On a dropped scheduler the task never runs and the returned token is
    /// already cancelled.
    pub fn schedule_after(&self, delay: f64, task: impl FnOnce() + 'static) -> CancellationToken {
        let token = CancellationToken::new();
        let Some(inner) = self.inner.upgrade() else {
            tracing::warn!(delay, "task scheduled on a dropped scheduler");
            token.cancel();
            return token;
        };
        let mut inner = inner.borrow_mut();
        // Drop tasks cancelled since the last frame
        inner.tasks.retain(|_, task| !task.token.is_cancelled());
        inner.tasks.insert(DelayedTask {
            remaining: delay,
            token: token.clone(),
            task: Box::new(task),
        });
        token
    }

    /// True while the scheduler this handle points to exists
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
