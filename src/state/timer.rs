//! Timer Module - Clock and one-shot timers
//!
//! The click state machine needs a clock and cancellable one-shot timers.
//! Both come from a [`Scheduler`], so timing is deterministic in tests.
//!
//! # API
//!
//! - `Scheduler::now` - Monotonic time since an arbitrary origin
//! - `Scheduler::set_timeout(delay, task)` - Run `task` once after `delay`
//! - `Scheduler::clear_timeout(id)` - Cancel a pending task
//! - [`ManualScheduler`] - Clock that only moves when told to
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use spark_dom::state::{ManualScheduler, Scheduler};
//!
//! let clock = ManualScheduler::new();
//! clock.set_timeout(Duration::from_millis(300), Box::new(|| println!("fired")))?;
//! clock.advance(Duration::from_millis(299)); // nothing
//! clock.advance(Duration::from_millis(1));   // fired
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::Result;

// =============================================================================
// TYPES
// =============================================================================

/// Handle of a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Clock and timer capability.
pub trait Scheduler {
    /// Time elapsed since the scheduler's origin.
    fn now(&self) -> Duration;

    /// Run `task` once, `delay` from now.
    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Result<TimerId>;

    /// Cancel a pending task. Unknown or already-fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

// =============================================================================
// Manual scheduler
// =============================================================================

struct Task {
    id: TimerId,
    due: Duration,
    run: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    tasks: Vec<Task>,
}

/// Scheduler whose clock moves only through [`advance`](Self::advance).
///
/// Clones share the same clock and task queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `by`, running every task that comes due.
    pub fn advance(&self, by: Duration) {
        let target = self.inner.borrow().now + by;
        self.advance_to(target);
    }

    /// Move the clock to `target`, running due tasks in deadline order.
    ///
    /// Tasks run with the queue unborrowed, so they may schedule or cancel
    /// other timers. A task scheduled for a time at or before `target` by an
    /// earlier task also runs.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let task = {
                let mut inner = self.inner.borrow_mut();
                let next = inner
                    .tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, task)| task.due <= target)
                    .min_by_key(|(_, task)| (task.due, task.id.raw()))
                    .map(|(index, _)| index);
                match next {
                    Some(index) => {
                        let task = inner.tasks.remove(index);
                        inner.now = inner.now.max(task.due);
                        task
                    }
                    None => {
                        inner.now = inner.now.max(target);
                        return;
                    }
                }
            };
            (task.run)();
        }
    }

    /// Number of timers still waiting.
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Result<TimerId> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = TimerId(inner.next_id);
        let due = inner.now + delay;
        inner.tasks.push(Task { id, due, run: task });
        Ok(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().tasks.retain(|task| task.id != id);
    }
}
