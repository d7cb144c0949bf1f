// ============================================================================
// spark-features - Collections
// The observable feature collection backing every container
// ============================================================================

mod features;

pub use features::FeatureCollection;
