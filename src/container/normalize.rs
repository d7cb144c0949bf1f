// ============================================================================
// spark-features - Feature Normalizer
// Turn any feature-like input into one canonical native feature
// ============================================================================

use crate::container::descriptor::FeatureLike;
use crate::container::format::read_feature;
use crate::container::identity::resolve_id;
use crate::error::Result;
use crate::primitives::feature::Feature;
use crate::projection::CoordinateTransform;

/// Normalize `input` to a native feature carrying a stable id.
///
/// - Component: suspends until the component resolves (`Resolution` error if
///   it never does or hands over something else).
/// - Raw descriptor: parsed and converted from data to view coordinates
///   (`Type` error if it is not a Feature record).
/// - Native feature: taken as is.
///
/// The id is resolved on `input` first, so a caller holding the same input
/// sees the same id on every call. A resolved component feature without an
/// id of its own inherits the component's.
pub async fn normalize(input: &mut FeatureLike, transform: &dyn CoordinateTransform) -> Result<Feature> {
    let id = resolve_id(input);

    let feature = match input {
        FeatureLike::Component(component) => component.resolve_feature().await?,
        FeatureLike::Raw(value) => read_feature(value, transform)?,
        FeatureLike::Native(feature) => feature.clone(),
    };

    if feature.id().is_none() {
        feature.set_id(id);
    }

    Ok(feature)
}

// =============================================================================
// TESTS
// =============================================================================
