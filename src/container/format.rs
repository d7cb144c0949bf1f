// ============================================================================
// spark-features - Feature Format
// Reading GeoJSON descriptors into native features and writing them back
// ============================================================================

use geo_types::Geometry;
use geojson::GeoJson;
use serde_json::Value;

use crate::core::types::FeatureId;
use crate::error::{FeatureError, Result};
use crate::primitives::feature::Feature;
use crate::projection::CoordinateTransform;

/// Parse a GeoJSON Feature record in data coordinates into a native feature
/// in view coordinates.
///
/// Records may omit `"type"` and `"geometry"`; they default to `"Feature"`
/// and no geometry. Anything that is not a Feature (a bare geometry, a
/// FeatureCollection, a scalar) is a type error.
pub fn read_feature(value: &Value, transform: &dyn CoordinateTransform) -> Result<Feature> {
    let mut record = match value {
        Value::Object(object) => object.clone(),
        other => return Err(FeatureError::type_error(json_kind(other))),
    };
    record
        .entry("type")
        .or_insert_with(|| Value::String("Feature".to_string()));
    record.entry("geometry").or_insert(Value::Null);

    let parsed = GeoJson::from_json_value(Value::Object(record))
        .map_err(|err| FeatureError::type_error(format!("malformed descriptor ({})", err)))?;

    let descriptor = match parsed {
        GeoJson::Feature(feature) => feature,
        GeoJson::Geometry(_) => return Err(FeatureError::type_error("Geometry")),
        GeoJson::FeatureCollection(_) => return Err(FeatureError::type_error("FeatureCollection")),
    };

    let mut feature = Feature::new();
    if let Some(id) = descriptor.id {
        feature = feature.with_id(FeatureId::from(id));
    }
    if let Some(geometry) = descriptor.geometry {
        let geometry = Geometry::<f64>::try_from(geometry)
            .map_err(|err| FeatureError::type_error(format!("unsupported geometry ({})", err)))?;
        feature = feature.with_geometry(transform.geometry_to_view(&geometry));
    }
    if let Some(properties) = descriptor.properties {
        feature = feature.with_properties(properties);
    }

    Ok(feature)
}

/// Write a native feature as a GeoJSON Feature, converting its geometry
/// with `transform.to_data`.
pub fn write_feature(feature: &Feature, transform: &dyn CoordinateTransform) -> geojson::Feature {
    let geometry = feature.with_geometry_ref(|geometry| {
        geometry.map(|g| {
            let g = transform.geometry_to_data(g);
            geojson::Geometry::new(geojson::Value::from(&g))
        })
    });

    geojson::Feature {
        bbox: None,
        geometry,
        id: feature.id().map(Into::into),
        properties: Some(feature.properties()),
        foreign_members: None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// TESTS
// =============================================================================
