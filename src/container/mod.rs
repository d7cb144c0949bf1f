// ============================================================================
// spark-features - Container
// Feature-collection synchronization: normalize, reconcile, watch, notify
// ============================================================================

pub mod descriptor;
pub mod emitter;
pub mod format;
pub mod identity;
pub mod merge;
pub mod normalize;
pub mod options;
pub mod watcher;

mod features_container;

pub use descriptor::{DeferredComponent, FeatureComponent, FeatureLike, FeatureResolver};
pub use emitter::{FeatureEvent, FeatureEventKind, FeatureEvents};
pub use features_container::{ContainerBuilder, FeaturesContainer};
pub use format::{read_feature, write_feature};
pub use identity::resolve_id;
pub use merge::{merge_features, reconcile, Reconciled};
pub use normalize::normalize;
pub use options::ContainerOptions;
pub use watcher::FeatureWatcher;
