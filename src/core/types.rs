// ============================================================================
// spark-features - Core Types
// Feature identity (external id) and object identity (watcher token)
// ============================================================================
//
// Two identity concepts live side by side and are never collapsed:
//
// 1. FeatureId - externally meaningful, used for de-duplication and merge
//    lookups. May be assigned late (see container::identity).
// 2. ObjectUid - stamped on every native feature at construction, unique for
//    the life of the process. Keys the per-feature watcher state.
// ============================================================================

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// =============================================================================
// FEATURE ID
// =============================================================================

/// External identifier of a feature: a string or a number, as in GeoJSON.
///
/// Numbers compare by value, so `1` and `1.0` are the same id. A string
/// never equals a number.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Text(String),
    Number(serde_json::Number),
}

/// Canonical form of a numeric id, used for equality and hashing.
#[derive(PartialEq, Eq, Hash)]
enum NumberKey {
    Int(i64),
    UInt(u64),
    Float(u64),
}

// 2^64, the first float past u64::MAX
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn number_key(n: &serde_json::Number) -> NumberKey {
    if let Some(i) = n.as_i64() {
        return NumberKey::Int(i);
    }
    if let Some(u) = n.as_u64() {
        return NumberKey::UInt(u);
    }
    let f = n.as_f64().unwrap_or(f64::NAN);
    if f.fract() == 0.0 {
        if f >= i64::MIN as f64 && f < i64::MAX as f64 {
            return NumberKey::Int(f as i64);
        }
        if f >= 0.0 && f < U64_LIMIT {
            return NumberKey::UInt(f as u64);
        }
    }
    NumberKey::Float(f.to_bits())
}

impl PartialEq for FeatureId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FeatureId::Text(a), FeatureId::Text(b)) => a == b,
            (FeatureId::Number(a), FeatureId::Number(b)) => number_key(a) == number_key(b),
            _ => false,
        }
    }
}

impl Eq for FeatureId {}

impl Hash for FeatureId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            FeatureId::Text(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            FeatureId::Number(n) => {
                1u8.hash(state);
                number_key(n).hash(state);
            }
        }
    }
}

impl FeatureId {
    /// Generate a fresh, globally unique id (UUID v4).
    pub fn generate() -> Self {
        FeatureId::Text(uuid::Uuid::new_v4().to_string())
    }

    /// Read an id out of a JSON value. Only strings and numbers qualify.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(FeatureId::Text(s.clone())),
            serde_json::Value::Number(n) => Some(FeatureId::Number(n.clone())),
            _ => None,
        }
    }

    /// JSON representation of this id.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FeatureId::Text(s) => serde_json::Value::String(s.clone()),
            FeatureId::Number(n) => serde_json::Value::Number(n.clone()),
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Text(s) => f.write_str(s),
            FeatureId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        FeatureId::Text(value.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        FeatureId::Text(value)
    }
}

impl From<i64> for FeatureId {
    fn from(value: i64) -> Self {
        FeatureId::Number(value.into())
    }
}

impl From<u64> for FeatureId {
    fn from(value: u64) -> Self {
        FeatureId::Number(value.into())
    }
}

impl From<geojson::feature::Id> for FeatureId {
    fn from(value: geojson::feature::Id) -> Self {
        match value {
            geojson::feature::Id::String(s) => FeatureId::Text(s),
            geojson::feature::Id::Number(n) => FeatureId::Number(n),
        }
    }
}

impl From<FeatureId> for geojson::feature::Id {
    fn from(value: FeatureId) -> Self {
        match value {
            FeatureId::Text(s) => geojson::feature::Id::String(s),
            FeatureId::Number(n) => geojson::feature::Id::Number(n),
        }
    }
}

// =============================================================================
// OBJECT UID (watcher token)
// =============================================================================

/// Opaque, process-wide unique token for one native feature instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectUid(u64);

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

impl ObjectUid {
    /// Allocate the next token. Tokens are never reused.
    pub fn next() -> Self {
        ObjectUid(NEXT_UID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
