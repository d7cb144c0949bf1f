// ============================================================================
// spark-features - Feature
// The canonical native feature object: identity, geometry, properties
// ============================================================================
//
// A Feature is a shared handle. Clones point at the same object, and
// equality is object identity, not id equality.
//
// Two event streams report mutation:
// - propertychange: a named property (geometry included) got a new value
// - change: a generic revision (geometry edited in place, id changed, ...)
//
// Replacing the geometry fires both, like a geometry-valued property whose
// value also bubbles its own change.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use geo_types::Geometry;
use serde_json::{Map, Value};

use crate::core::constants::GEOMETRY_KEY;
use crate::core::types::{FeatureId, ObjectUid};
use crate::error::{FeatureError, Result};
use crate::reactivity::events::{Listeners, Subscription};

/// Free-form feature properties
pub type Properties = Map<String, Value>;

// =============================================================================
// EVENTS
// =============================================================================

/// Payload of a `propertychange` event.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    pub key: String,
    pub old_value: Option<Value>,
}

/// GeoJSON geometry object for a geometry value
pub(crate) fn geometry_json(geometry: &Geometry<f64>) -> Option<Value> {
    serde_json::to_value(geojson::Geometry::new(geojson::Value::from(geometry))).ok()
}

// =============================================================================
// FEATURE INNER
// =============================================================================

struct FeatureInner {
    uid: ObjectUid,
    id: RefCell<Option<FeatureId>>,

    /// Geometry in view coordinates
    geometry: RefCell<Option<Geometry<f64>>>,

    properties: RefCell<Properties>,

    property_changes: Rc<Listeners<PropertyChange>>,
    changes: Rc<Listeners<()>>,

    disposed: Cell<bool>,
}

// =============================================================================
// FEATURE
// =============================================================================

/// A native feature object.
///
/// # Example
///
/// ```
/// use spark_features::Feature;
/// use geo_types::{Geometry, Point};
///
/// let feature = Feature::new()
///     .with_id("f1")
///     .with_geometry(Geometry::Point(Point::new(1.0, 2.0)))
///     .with_property("name", "well");
///
/// assert_eq!(feature.id(), Some("f1".into()));
/// assert_eq!(feature.property("name"), Some("well".into()));
/// ```
#[derive(Clone)]
pub struct Feature {
    inner: Rc<FeatureInner>,
}

impl Feature {
    /// Create an empty feature with a fresh object token.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(FeatureInner {
                uid: ObjectUid::next(),
                id: RefCell::new(None),
                geometry: RefCell::new(None),
                properties: RefCell::new(Map::new()),
                property_changes: Rc::new(Listeners::new()),
                changes: Rc::new(Listeners::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    // =========================================================================
    // BUILDERS (no events - the feature is not observed yet)
    // =========================================================================

    pub fn with_id(self, id: impl Into<FeatureId>) -> Self {
        *self.inner.id.borrow_mut() = Some(id.into());
        self
    }

    pub fn with_geometry(self, geometry: impl Into<Geometry<f64>>) -> Self {
        *self.inner.geometry.borrow_mut() = Some(geometry.into());
        self
    }

    pub fn with_property(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner
            .properties
            .borrow_mut()
            .insert(key.into(), value.into());
        self
    }

    pub fn with_properties(self, properties: Properties) -> Self {
        self.inner.properties.borrow_mut().extend(properties);
        self
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    /// Process-wide unique token for this object.
    pub fn uid(&self) -> ObjectUid {
        self.inner.uid
    }

    pub fn id(&self) -> Option<FeatureId> {
        self.inner.id.borrow().clone()
    }

    /// Replace the id. Fires `change` when the id actually changes.
    pub fn set_id(&self, id: impl Into<FeatureId>) {
        let id = id.into();
        let changed = {
            let mut slot = self.inner.id.borrow_mut();
            if slot.as_ref() == Some(&id) {
                false
            } else {
                *slot = Some(id);
                true
            }
        };
        if changed {
            self.changed();
        }
    }

    /// Same object?
    pub fn ptr_eq(&self, other: &Feature) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // GEOMETRY
    // =========================================================================

    pub fn geometry(&self) -> Option<Geometry<f64>> {
        self.inner.geometry.borrow().clone()
    }

    /// Read the geometry without cloning it.
    pub fn with_geometry_ref<R>(&self, f: impl FnOnce(Option<&Geometry<f64>>) -> R) -> R {
        f(self.inner.geometry.borrow().as_ref())
    }

    /// Replace the geometry. Fires `propertychange` (key `geometry`) and
    /// `change` when the value differs.
    pub fn set_geometry(&self, geometry: Option<Geometry<f64>>) {
        let old = {
            let mut slot = self.inner.geometry.borrow_mut();
            if *slot == geometry {
                return;
            }
            std::mem::replace(&mut *slot, geometry)
        };

        self.inner.property_changes.emit(&PropertyChange {
            key: GEOMETRY_KEY.to_string(),
            old_value: old.as_ref().and_then(geometry_json),
        });
        self.changed();
    }

    /// Edit the geometry in place (e.g. moving a vertex during a drag).
    ///
    /// The closure works on a copy, so it may read this feature freely; the
    /// copy is stored once it returns. Fires `change`. Returns false, without
    /// firing, if there is no geometry.
    pub fn update_geometry(&self, f: impl FnOnce(&mut Geometry<f64>)) -> bool {
        let Some(mut geometry) = self.geometry() else {
            return false;
        };
        f(&mut geometry);
        *self.inner.geometry.borrow_mut() = Some(geometry);
        self.changed();
        true
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    pub fn property(&self, key: &str) -> Option<Value> {
        self.inner.properties.borrow().get(key).cloned()
    }

    pub fn properties(&self) -> Properties {
        self.inner.properties.borrow().clone()
    }

    /// Set one property. Fires `propertychange` when the value differs.
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let old = {
            let mut props = self.inner.properties.borrow_mut();
            if props.get(&key) == Some(&value) {
                return;
            }
            props.insert(key.clone(), value)
        };

        self.inner.property_changes.emit(&PropertyChange {
            key,
            old_value: old,
        });
    }

    /// Set several properties; keys not mentioned are left alone.
    pub fn set_properties(&self, properties: Properties) {
        for (key, value) in properties {
            self.set_property(key, value);
        }
    }

    /// Remove a property, firing `propertychange` if it existed.
    pub fn unset_property(&self, key: &str) -> Option<Value> {
        let old = self.inner.properties.borrow_mut().remove(key);
        if old.is_some() {
            self.inner.property_changes.emit(&PropertyChange {
                key: key.to_string(),
                old_value: old.clone(),
            });
        }
        old
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Fire a generic `change` event.
    pub fn changed(&self) {
        self.inner.changes.emit(&());
    }

    /// Listen to `propertychange`. Fails on a disposed feature.
    pub fn on_property_change(
        &self,
        f: impl Fn(&PropertyChange) + 'static,
    ) -> Result<Subscription> {
        self.ensure_live()?;
        Ok(self.inner.property_changes.subscribe(f))
    }

    /// Listen to `change`. Fails on a disposed feature.
    pub fn on_change(&self, f: impl Fn() + 'static) -> Result<Subscription> {
        self.ensure_live()?;
        Ok(self.inner.changes.subscribe(move |_| f()))
    }

    /// Number of listeners attached across both streams.
    pub fn listener_count(&self) -> usize {
        self.inner.property_changes.len() + self.inner.changes.len()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.inner.disposed.get() {
            return Err(FeatureError::watch(self.uid(), "feature has been disposed"));
        }
        Ok(())
    }

    // =========================================================================
    // DISPOSAL
    // =========================================================================

    /// Tear down the event target. Existing listeners are dropped and new
    /// ones are refused.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.inner.property_changes.clear();
        self.inner.changes.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl Default for Feature {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Feature {}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("uid", &self.inner.uid)
            .field("id", &self.inner.id.borrow())
            .field("geometry", &self.inner.geometry.borrow())
            .field("properties", &self.inner.properties.borrow())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
