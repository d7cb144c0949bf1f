// ============================================================================
// spark-features - Identity Resolver
// ============================================================================

use serde_json::Value;

use crate::container::descriptor::FeatureLike;
use crate::core::types::FeatureId;

/// Return the input's id, assigning a fresh one in place if it has none.
///
/// Inputs that already carry an id keep it, so resolving the same object
/// again always yields the same id. A raw descriptor that is not a JSON
/// object cannot hold an id; it gets a fresh one that is not stored (the
/// normalizer rejects it anyway).
pub fn resolve_id(input: &mut FeatureLike) -> FeatureId {
    match input {
        FeatureLike::Raw(value) => resolve_raw_id(value),
        FeatureLike::Component(component) => match component.id() {
            Some(id) => id,
            None => {
                let id = FeatureId::generate();
                component.set_id(id.clone());
                id
            }
        },
        FeatureLike::Native(feature) => match feature.id() {
            Some(id) => id,
            None => {
                let id = FeatureId::generate();
                feature.set_id(id.clone());
                id
            }
        },
    }
}

fn resolve_raw_id(value: &mut Value) -> FeatureId {
    if let Some(id) = value.get("id").and_then(FeatureId::from_json) {
        return id;
    }

    let id = FeatureId::generate();
    if let Value::Object(object) = value {
        object.insert("id".to_string(), id.to_json());
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::descriptor::DeferredComponent;
    use crate::primitives::feature::Feature;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn existing_ids_are_kept() {
        let mut raw = FeatureLike::from(json!({"id": 12, "geometry": null}));
        assert_eq!(resolve_id(&mut raw), FeatureId::from(12i64));

        let mut native = FeatureLike::from(Feature::new().with_id("n"));
        assert_eq!(resolve_id(&mut native), FeatureId::from("n"));
    }

    #[test]
    fn raw_descriptor_gets_id_written_back() {
        let mut raw = FeatureLike::from(json!({"geometry": null}));
        let id = resolve_id(&mut raw);

        assert_eq!(raw.id(), Some(id.clone()));
        // Stable on repeat
        assert_eq!(resolve_id(&mut raw), id);
    }

    #[test]
    fn null_id_counts_as_missing() {
        let mut raw = FeatureLike::from(json!({"id": null}));
        let id = resolve_id(&mut raw);
        assert_eq!(raw.id(), Some(id));
    }

    #[test]
    fn native_and_component_ids_are_assigned_in_place() {
        let feature = Feature::new();
        let mut native = FeatureLike::from(feature.clone());
        let id = resolve_id(&mut native);
        assert_eq!(feature.id(), Some(id));

        let component = Rc::new(DeferredComponent::resolved(Feature::new()));
        let mut wrapped = FeatureLike::from(component.clone());
        let id = resolve_id(&mut wrapped);
        assert_eq!(crate::FeatureComponent::id(&*component), Some(id.clone()));
        assert_eq!(resolve_id(&mut wrapped), id);
    }

    #[test]
    fn non_object_raw_still_gets_an_id() {
        let mut raw = FeatureLike::from(json!("not a feature"));
        let a = resolve_id(&mut raw);
        let b = resolve_id(&mut raw);
        assert_ne!(a, b);
    }
}
