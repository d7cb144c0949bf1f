// ============================================================================
// spark-features - Feature Descriptors
// The three shapes a feature can arrive in
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde_json::Value;

use crate::core::types::FeatureId;
use crate::error::ResolveError;
use crate::primitives::feature::Feature;

// =============================================================================
// COMPONENT WRAPPER
// =============================================================================

/// A declarative component that owns (or will own) a native feature.
pub trait FeatureComponent {
    /// The id the component was declared with, if any.
    fn id(&self) -> Option<FeatureId>;

    /// Assign an id to a component declared without one.
    fn set_id(&self, id: FeatureId);

    /// Wait for the component to hand over its native feature.
    fn resolve_feature(&self) -> LocalBoxFuture<'_, Result<Feature, ResolveError>>;
}

/// A component whose native feature is delivered later through a
/// [`FeatureResolver`].
///
/// Every `resolve_feature` call waits on the same delivery, so a component
/// can be resolved for an add and again for a remove.
///
/// # Example
///
/// ```
/// use spark_features::{DeferredComponent, Feature, FeatureComponent};
///
/// let (component, resolver) = DeferredComponent::new();
/// let feature = Feature::new().with_id("late");
/// resolver.resolve(feature.clone());
///
/// let resolved = futures::executor::block_on(component.resolve_feature()).unwrap();
/// assert_eq!(resolved, feature);
/// ```
pub struct DeferredComponent {
    id: RefCell<Option<FeatureId>>,
    delivery: Shared<oneshot::Receiver<Feature>>,
}

impl DeferredComponent {
    /// A pending component and the handle that resolves it.
    ///
    /// Dropping the resolver without resolving fails every waiter with
    /// [`ResolveError::Canceled`].
    pub fn new() -> (Self, FeatureResolver) {
        let (sender, receiver) = oneshot::channel();
        let component = Self {
            id: RefCell::new(None),
            delivery: receiver.shared(),
        };
        (component, FeatureResolver { sender })
    }

    /// A component that is already resolved.
    pub fn resolved(feature: Feature) -> Self {
        let (component, resolver) = Self::new();
        resolver.resolve(feature);
        component
    }

    pub fn with_id(self, id: impl Into<FeatureId>) -> Self {
        *self.id.borrow_mut() = Some(id.into());
        self
    }
}

impl FeatureComponent for DeferredComponent {
    fn id(&self) -> Option<FeatureId> {
        self.id.borrow().clone()
    }

    fn set_id(&self, id: FeatureId) {
        *self.id.borrow_mut() = Some(id);
    }

    fn resolve_feature(&self) -> LocalBoxFuture<'_, Result<Feature, ResolveError>> {
        let delivery = self.delivery.clone();
        async move { delivery.await.map_err(|_| ResolveError::Canceled) }.boxed_local()
    }
}

impl fmt::Debug for DeferredComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredComponent")
            .field("id", &self.id.borrow())
            .field("resolved", &self.delivery.peek().is_some())
            .finish()
    }
}

/// Delivers the native feature to a [`DeferredComponent`].
pub struct FeatureResolver {
    sender: oneshot::Sender<Feature>,
}

impl FeatureResolver {
    /// Hand over the feature. Returns false if the component is gone.
    pub fn resolve(self, feature: Feature) -> bool {
        self.sender.send(feature).is_ok()
    }
}

// =============================================================================
// FEATURE-LIKE INPUT
// =============================================================================

/// Anything a container accepts where a feature is expected.
#[derive(Clone)]
pub enum FeatureLike {
    /// A GeoJSON Feature record in data coordinates
    Raw(Value),

    /// A component that resolves to a native feature
    Component(Rc<dyn FeatureComponent>),

    /// A native feature in view coordinates
    Native(Feature),
}

impl FeatureLike {
    /// The id carried by the input right now, without assigning one.
    pub fn id(&self) -> Option<FeatureId> {
        match self {
            FeatureLike::Raw(value) => value.get("id").and_then(FeatureId::from_json),
            FeatureLike::Component(component) => component.id(),
            FeatureLike::Native(feature) => feature.id(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeatureLike::Raw(_) => "raw descriptor",
            FeatureLike::Component(_) => "component",
            FeatureLike::Native(_) => "native feature",
        }
    }
}

impl From<Value> for FeatureLike {
    fn from(value: Value) -> Self {
        FeatureLike::Raw(value)
    }
}

impl From<Feature> for FeatureLike {
    fn from(feature: Feature) -> Self {
        FeatureLike::Native(feature)
    }
}

impl From<&Feature> for FeatureLike {
    fn from(feature: &Feature) -> Self {
        FeatureLike::Native(feature.clone())
    }
}

impl From<Rc<dyn FeatureComponent>> for FeatureLike {
    fn from(component: Rc<dyn FeatureComponent>) -> Self {
        FeatureLike::Component(component)
    }
}

impl From<Rc<DeferredComponent>> for FeatureLike {
    fn from(component: Rc<DeferredComponent>) -> Self {
        FeatureLike::Component(component)
    }
}

impl fmt::Debug for FeatureLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureLike::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
            FeatureLike::Component(component) => f
                .debug_struct("Component")
                .field("id", &component.id())
                .finish(),
            FeatureLike::Native(feature) => f.debug_tuple("Native").field(feature).finish(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn deferred_component_resolves_once_for_many_waiters() {
        let (component, resolver) = DeferredComponent::new();
        let feature = Feature::new();
        assert!(resolver.resolve(feature.clone()));

        assert_eq!(block_on(component.resolve_feature()), Ok(feature.clone()));
        assert_eq!(block_on(component.resolve_feature()), Ok(feature));
    }

    #[test]
    fn dropped_resolver_cancels() {
        let (component, resolver) = DeferredComponent::new();
        drop(resolver);
        assert_eq!(
            block_on(component.resolve_feature()),
            Err(ResolveError::Canceled)
        );
    }

    #[test]
    fn resolver_reports_missing_component() {
        let (component, resolver) = DeferredComponent::new();
        drop(component);
        assert!(!resolver.resolve(Feature::new()));
    }

    #[test]
    fn feature_like_id_peeks_without_assigning() {
        let raw = FeatureLike::from(json!({"id": "r", "geometry": null}));
        assert_eq!(raw.id(), Some("r".into()));

        let bare = FeatureLike::from(json!({"geometry": null}));
        assert_eq!(bare.id(), None);

        let component: Rc<DeferredComponent> =
            Rc::new(DeferredComponent::resolved(Feature::new()).with_id("c"));
        assert_eq!(FeatureLike::from(component).id(), Some("c".into()));

        let native = FeatureLike::from(Feature::new().with_id(3i64));
        assert_eq!(native.id(), Some(3i64.into()));
        assert_eq!(native.kind(), "native feature");
    }
}
