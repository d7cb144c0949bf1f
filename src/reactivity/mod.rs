// ============================================================================
// spark-features - Reactivity Module
// Listener plumbing, deferred scheduling, and debounced coalescing
// ============================================================================

pub mod debounce;
pub mod events;
pub mod scheduling;

pub use debounce::Debouncer;
pub use events::{ListenerKey, Listeners, Subscription, TeardownFn};
pub use scheduling::{Clock, ManualClock, MonotonicClock, Scheduler, Task, TimerId};
