// ============================================================================
// spark-features - Primitives
// Feature objects, revision counter, memoized views, subscription scopes
// ============================================================================

pub mod feature;
pub mod memo;
pub mod revision;
pub mod scope;

pub use feature::{Feature, Properties, PropertyChange};
pub use memo::RevisionMemo;
pub use revision::Revision;
pub use scope::{ScopeCleanupFn, ScopeKey, SubscriptionScope};
