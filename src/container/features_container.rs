// ============================================================================
// spark-features - Features Container
// The public face: add / remove / query features, observe changes
// ============================================================================
//
// Wiring, set up once at construction:
//
//   add_feature(item)
//     -> normalize (resolve id, resolve component / parse descriptor)
//     -> reconcile (insert, or merge into the member with the same id)
//     -> store add event -> watcher.watch -> revision bump + feature-added
//
//   store remove event -> watcher.unwatch -> revision bump + feature-removed
//
// The store's add/remove listeners live in the container's subscription
// scope; disposing the container ends them and every per-feature watch.
// ============================================================================

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use futures::future::join_all;

use crate::collections::FeatureCollection;
use crate::container::descriptor::FeatureLike;
use crate::container::emitter::{FeatureEvent, FeatureEventKind, FeatureEvents};
use crate::container::format::write_feature;
use crate::container::merge::reconcile;
use crate::container::normalize::normalize;
use crate::container::options::ContainerOptions;
use crate::container::watcher::FeatureWatcher;
use crate::core::context::current_scheduler;
use crate::core::types::FeatureId;
use crate::error::Result;
use crate::primitives::feature::Feature;
use crate::primitives::memo::RevisionMemo;
use crate::primitives::revision::Revision;
use crate::primitives::scope::SubscriptionScope;
use crate::projection::{CoordinateTransform, IdentityTransform};
use crate::reactivity::events::Subscription;
use crate::reactivity::scheduling::Scheduler;

// =============================================================================
// BUILDER
// =============================================================================

/// Configures and builds a [`FeaturesContainer`].
#[derive(Default)]
pub struct ContainerBuilder {
    options: ContainerOptions,
    scheduler: Option<Rc<Scheduler>>,
    transform: Option<Rc<dyn CoordinateTransform>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn frame_rate(mut self, frame_rate: u32) -> Self {
        self.options.frame_rate = frame_rate;
        self
    }

    pub fn debounce_ms(mut self, ms: f64) -> Self {
        self.options.debounce_ms = Some(ms);
        self
    }

    /// Scheduler for timers and deferred notifications. Defaults to the
    /// thread-local one.
    pub fn scheduler(mut self, scheduler: Rc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Data <-> view coordinate conversion. Defaults to identity.
    pub fn transform(mut self, transform: impl CoordinateTransform + 'static) -> Self {
        self.transform = Some(Rc::new(transform));
        self
    }

    pub fn build(self) -> Result<FeaturesContainer> {
        self.options.validate()?;
        let scheduler = self.scheduler.unwrap_or_else(current_scheduler);
        let transform = self
            .transform
            .unwrap_or_else(|| Rc::new(IdentityTransform));
        Ok(FeaturesContainer::assemble(self.options, scheduler, transform))
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("options", &self.options)
            .field("scheduler", &self.scheduler.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

// =============================================================================
// CONTAINER INNER
// =============================================================================

struct ContainerInner {
    options: ContainerOptions,
    scheduler: Rc<Scheduler>,
    transform: Rc<dyn CoordinateTransform>,

    store: FeatureCollection,
    watcher: Rc<FeatureWatcher>,
    revision: Rc<Revision>,
    events: Rc<FeatureEvents>,

    /// Store add/remove listeners
    subs: SubscriptionScope,

    alive: Cell<bool>,

    ids_view: RevisionMemo<Vec<FeatureId>>,
    data_view: RevisionMemo<Vec<geojson::Feature>>,
    view_view: RevisionMemo<Vec<geojson::Feature>>,
}

impl ContainerInner {
    fn dispose(&self) {
        if !self.alive.replace(false) {
            return;
        }

        self.subs.dispose();
        let watches = self.watcher.unwatch_all();
        self.events.clear();
        self.revision.clear_subscribers();

        log::debug!(
            "features container disposed ({} watches dropped, {} features left)",
            watches,
            self.store.len()
        );
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// FEATURES CONTAINER
// =============================================================================

/// An observable, ordered collection of features kept in sync with
/// whatever feeds it descriptors, components or native features.
///
/// Clones share the same container. Dropping the last handle disposes it.
///
/// # Example
///
/// ```
/// use spark_features::{FeatureId, FeaturesContainer};
/// use futures::executor::block_on;
/// use serde_json::json;
///
/// let container = FeaturesContainer::new();
/// block_on(container.add_feature(json!({
///     "id": "f1",
///     "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
/// })))
/// .unwrap();
///
/// let id = FeatureId::from("f1");
/// assert!(container.get_feature_by_id(&id).is_some());
/// assert_eq!(container.revision(), 1);
/// ```
#[derive(Clone)]
pub struct FeaturesContainer {
    inner: Rc<ContainerInner>,
}

impl FeaturesContainer {
    /// Container with default options on the thread-local scheduler.
    pub fn new() -> Self {
        Self::assemble(
            ContainerOptions::default(),
            current_scheduler(),
            Rc::new(IdentityTransform),
        )
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn assemble(
        options: ContainerOptions,
        scheduler: Rc<Scheduler>,
        transform: Rc<dyn CoordinateTransform>,
    ) -> Self {
        let revision = Rc::new(Revision::new());
        let events = Rc::new(FeatureEvents::new(scheduler.clone()));
        let watcher = Rc::new(FeatureWatcher::new(
            scheduler.clone(),
            options.debounce_window(),
            revision.clone(),
            events.clone(),
        ));

        let store = FeatureCollection::new();
        let subs = SubscriptionScope::new();

        let w = watcher.clone();
        subs.subscribe(store.on_admit(move |feature| w.watch(feature)));
        let w = watcher.clone();
        subs.subscribe(store.on_remove(move |feature| {
            w.unwatch(feature);
        }));

        Self {
            inner: Rc::new(ContainerInner {
                options,
                scheduler,
                transform,
                store,
                watcher,
                revision,
                events,
                subs,
                alive: Cell::new(true),
                ids_view: RevisionMemo::new(),
                data_view: RevisionMemo::new(),
                view_view: RevisionMemo::new(),
            }),
        }
    }

    // =========================================================================
    // ADD
    // =========================================================================

    /// Add one feature-like item.
    ///
    /// Returns the store member that now represents it: the normalized
    /// feature itself when inserted, or the existing member with the same
    /// id when merged. If the container was disposed while the item was
    /// resolving, nothing is added and the normalized feature is returned.
    pub async fn add_feature(&self, item: impl Into<FeatureLike>) -> Result<Feature> {
        let mut input = item.into();
        let feature = normalize(&mut input, &*self.inner.transform).await?;

        if !self.is_alive() {
            log::warn!(
                "feature {} resolved after the container was disposed; ignoring",
                feature.uid()
            );
            return Ok(feature);
        }

        Ok(reconcile(&self.inner.store, feature)?.into_feature())
    }

    /// Add several items concurrently.
    ///
    /// Every item runs to completion, even after a sibling has failed, so a
    /// slow component still lands once it resolves. The call then fails with
    /// the first error in input order. Store order follows completion order.
    pub async fn add_features<I>(&self, items: I) -> Result<Vec<Feature>>
    where
        I: IntoIterator,
        I::Item: Into<FeatureLike>,
    {
        join_all(items.into_iter().map(|item| self.add_feature(item)))
            .await
            .into_iter()
            .collect()
    }

    // =========================================================================
    // REMOVE
    // =========================================================================

    /// Remove the member with the item's id.
    ///
    /// Components are resolved first and matched by their feature's id.
    /// Returns `Ok(None)` if no member has that id.
    pub async fn remove_feature(&self, item: impl Into<FeatureLike>) -> Result<Option<Feature>> {
        let input = item.into();
        let id = match &input {
            FeatureLike::Component(component) => {
                let feature = component.resolve_feature().await?;
                feature.id().or_else(|| component.id())
            }
            other => other.id(),
        };

        if !self.is_alive() {
            log::warn!("remove requested on a disposed container; ignoring");
            return Ok(None);
        }

        Ok(id.and_then(|id| self.remove_feature_by_id(&id)))
    }

    /// Remove several items concurrently. Returns the members removed.
    ///
    /// Like [`add_features`](Self::add_features), every item runs to
    /// completion before the first error is returned.
    pub async fn remove_features<I>(&self, items: I) -> Result<Vec<Feature>>
    where
        I: IntoIterator,
        I::Item: Into<FeatureLike>,
    {
        let removed = join_all(items.into_iter().map(|item| self.remove_feature(item)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        Ok(removed.into_iter().flatten().collect())
    }

    /// Remove the member with this id, if any.
    pub fn remove_feature_by_id(&self, id: &FeatureId) -> Option<Feature> {
        let feature = self.inner.store.find_by_id(id)?;
        self.inner.store.remove(&feature).then_some(feature)
    }

    /// Remove every member, one feature-removed notification each.
    pub fn clear_features(&self) -> usize {
        self.inner.store.clear()
    }

    // =========================================================================
    // QUERY
    // =========================================================================

    /// Member with this id (linear scan).
    pub fn get_feature_by_id(&self, id: &FeatureId) -> Option<Feature> {
        self.inner.store.find_by_id(id)
    }

    /// Members in store order.
    pub fn get_features(&self) -> Vec<Feature> {
        self.inner.store.list()
    }

    /// The underlying collection. Features added or removed through it
    /// directly are still watched, but skip normalization and merging.
    /// Its `on_add` listeners observe admitted members and cannot veto them.
    pub fn features_collection(&self) -> &FeatureCollection {
        &self.inner.store
    }

    pub fn features_count(&self) -> usize {
        self.inner.store.len()
    }

    /// Is this exact object a member?
    pub fn contains_feature(&self, feature: &Feature) -> bool {
        self.inner.store.contains(feature)
    }

    // =========================================================================
    // DERIVED VIEWS (recomputed when the revision moves)
    // =========================================================================

    /// Ids of the members, in store order.
    pub fn feature_ids(&self) -> Vec<FeatureId> {
        let store = &self.inner.store;
        self.inner.ids_view.get(self.revision(), || {
            store.with_features(|features| features.iter().filter_map(Feature::id).collect())
        })
    }

    /// Members written as GeoJSON in data coordinates.
    pub fn features_data_proj(&self) -> Vec<geojson::Feature> {
        let store = &self.inner.store;
        let transform = &*self.inner.transform;
        self.inner.data_view.get(self.revision(), || {
            store.with_features(|features| {
                features
                    .iter()
                    .map(|feature| write_feature(feature, transform))
                    .collect()
            })
        })
    }

    /// Members written as GeoJSON in view coordinates.
    pub fn features_view_proj(&self) -> Vec<geojson::Feature> {
        let store = &self.inner.store;
        self.inner.view_view.get(self.revision(), || {
            store.with_features(|features| {
                features
                    .iter()
                    .map(|feature| write_feature(feature, &IdentityTransform))
                    .collect()
            })
        })
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    /// Observe every revision bump, synchronously.
    pub fn on_revision(&self, f: impl Fn(u64) + 'static) -> Subscription {
        self.inner.revision.subscribe(f)
    }

    /// Observe `feature-added`, delivered on the tick after the add.
    pub fn on_feature_added(&self, f: impl Fn(&Feature) + 'static) -> Subscription {
        self.inner.events.on(FeatureEventKind::Added, f)
    }

    /// Observe `feature-removed`, delivered on the tick after the removal.
    pub fn on_feature_removed(&self, f: impl Fn(&Feature) + 'static) -> Subscription {
        self.inner.events.on(FeatureEventKind::Removed, f)
    }

    /// Observe both notification kinds.
    pub fn on_feature_event(&self, f: impl Fn(&FeatureEvent) + 'static) -> Subscription {
        self.inner.events.subscribe(f)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    pub fn scheduler(&self) -> Rc<Scheduler> {
        self.inner.scheduler.clone()
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// Number of live per-feature watches. Equals `features_count()` while
    /// the container is alive.
    pub fn active_watchers(&self) -> usize {
        self.inner.watcher.active()
    }

    pub fn is_watching(&self, feature: &Feature) -> bool {
        self.inner.watcher.is_watching(feature)
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }

    /// Tear down: end the store listeners and every per-feature watch, and
    /// drop all observers. Members stay in the collection, unwatched.
    /// Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Default for FeaturesContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FeaturesContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeaturesContainer")
            .field("features", &self.inner.store.len())
            .field("watchers", &self.inner.watcher.active())
            .field("revision", &self.inner.revision.get())
            .field("alive", &self.inner.alive.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
