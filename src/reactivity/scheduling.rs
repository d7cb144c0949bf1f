// ============================================================================
// spark-features - Scheduling
// Next-tick task queue and timer queue, drained by the host event loop
// ============================================================================
//
// Rust has no microtask queue, so deferral is explicit: mutations push tasks
// with `next_tick`, and the host drains them with `tick()` at a defined point
// in its loop (after a frame, after awaiting a batch, ...). Tasks queued in
// one synchronous turn are delivered together but never merged.
//
// Timers run against a `Clock`. `MonotonicClock` follows wall time;
// `ManualClock` lets a render loop (or a test) advance time frame by frame.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::core::constants::MAX_TICK_TASKS;

// =============================================================================
// CLOCKS
// =============================================================================

/// Source of "now" for timers, as an offset from the clock's origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual time that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// A deferred unit of work
pub type Task = Box<dyn FnOnce()>;

/// Handle to a pending timer, used to cancel it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    deadline: Duration,
    seq: u64,
}

impl TimerId {
    /// When the timer is due, on the scheduler's clock.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Single-threaded cooperative scheduler.
pub struct Scheduler {
    clock: Rc<dyn Clock>,

    /// Tasks deferred to the next tick, in submission order
    ticks: RefCell<VecDeque<Task>>,

    /// Timers ordered by (deadline, sequence)
    timers: RefCell<BTreeMap<TimerId, Task>>,

    next_seq: Cell<u64>,

    /// Upper bound on tasks run by a single `tick()`
    max_tick_tasks: Cell<usize>,
}

impl Scheduler {
    /// Scheduler over wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(Rc::new(MonotonicClock::new()))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            ticks: RefCell::new(VecDeque::new()),
            timers: RefCell::new(BTreeMap::new()),
            next_seq: Cell::new(0),
            max_tick_tasks: Cell::new(MAX_TICK_TASKS),
        }
    }

    /// Scheduler over a fresh manual clock, returning both.
    pub fn manual() -> (Rc<Scheduler>, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        let scheduler = Rc::new(Self::with_clock(clock.clone()));
        (scheduler, clock)
    }

    /// The thread-local default scheduler.
    pub fn current() -> Rc<Scheduler> {
        crate::core::context::current_scheduler()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn set_max_tick_tasks(&self, max: usize) {
        self.max_tick_tasks.set(max.max(1));
    }

    // =========================================================================
    // NEXT TICK
    // =========================================================================

    /// Defer a task to the next `tick()`.
    pub fn next_tick(&self, task: impl FnOnce() + 'static) {
        self.ticks.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting for the next tick.
    pub fn pending_ticks(&self) -> usize {
        self.ticks.borrow().len()
    }

    /// Drain the next-tick queue, including tasks queued while draining.
    ///
    /// Returns the number of tasks run. Stops early (leaving the rest queued)
    /// if the queue keeps refilling past the max-flush guard.
    pub fn tick(&self) -> usize {
        let max = self.max_tick_tasks.get();
        let mut ran = 0;

        loop {
            if ran >= max {
                log::warn!(
                    "tick stopped after {} tasks with {} still queued; a task keeps re-queueing itself",
                    ran,
                    self.pending_ticks()
                );
                break;
            }

            // Pop outside the task call so tasks can queue more work
            let task = self.ticks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }

        ran
    }

    // =========================================================================
    // TIMERS
    // =========================================================================

    /// Run `task` once `delay` has elapsed on this scheduler's clock.
    pub fn set_timeout(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerId {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);

        let id = TimerId {
            deadline: self.now() + delay,
            seq,
        };
        self.timers.borrow_mut().insert(id, Box::new(task));
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was
    /// cancelled.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.timers.borrow_mut().remove(&id).is_some()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.borrow().keys().next().map(|id| id.deadline)
    }

    /// Fire every timer whose deadline has passed, earliest first.
    ///
    /// Timers set by a firing timer run in the same call if already due.
    pub fn run_timers(&self) -> usize {
        let mut fired = 0;

        loop {
            let now = self.now();
            let due = {
                let mut timers = self.timers.borrow_mut();
                match timers.keys().next().copied() {
                    Some(id) if id.deadline <= now => timers.remove(&id),
                    _ => None,
                }
            };

            match due {
                Some(task) => {
                    task();
                    fired += 1;
                }
                None => break,
            }
        }

        fired
    }

    /// Fire due timers, then drain the next-tick queue.
    pub fn run_until_idle(&self) -> usize {
        self.run_timers() + self.tick()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now())
            .field("pending_ticks", &self.pending_ticks())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
