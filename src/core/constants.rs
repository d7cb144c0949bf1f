// ============================================================================
// spark-features - Constants
// Event names, timing defaults and scheduler guards
// ============================================================================

use std::time::Duration;

// =============================================================================
// FEATURE EVENT NAMES
// =============================================================================

/// Fired by a feature when one of its properties (geometry included) changes
pub const PROPERTY_CHANGE: &str = "propertychange";

/// Fired by a feature on any generic revision (geometry edits, id changes)
pub const CHANGE: &str = "change";

/// Outward notification: a feature joined the container
pub const FEATURE_ADDED: &str = "feature-added";

/// Outward notification: a feature left the container
pub const FEATURE_REMOVED: &str = "feature-removed";

/// Property key reported when the geometry is replaced
pub const GEOMETRY_KEY: &str = "geometry";

// =============================================================================
// TIMING
// =============================================================================

/// Animation frames per second the debounce window is sized against
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// One animation frame at the default frame rate (~16.7ms)
pub const FRAME: Duration = Duration::from_nanos(1_000_000_000 / DEFAULT_FRAME_RATE as u64);

// =============================================================================
// SCHEDULER GUARDS
// =============================================================================

/// Maximum next-tick tasks drained in one `tick()` before we assume a task
/// keeps re-queueing itself
pub const MAX_TICK_TASKS: usize = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_one_sixtieth_of_a_second() {
        assert_eq!(FRAME.as_nanos(), 16_666_666);
    }

    #[test]
    fn event_names_are_distinct() {
        let names = [PROPERTY_CHANGE, CHANGE, FEATURE_ADDED, FEATURE_REMOVED];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
