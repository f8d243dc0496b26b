//! GeoJSON export of the visible locations for the shell's map layer.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use tracing::warn;

use crate::model::LocationRecord;

/// One point feature per location with a valid position. Locations with
/// out-of-range coordinates are skipped.
pub fn feature_collection<'a>(
    locations: impl IntoIterator<Item = &'a LocationRecord>,
) -> FeatureCollection {
    let features = locations
        .into_iter()
        .filter_map(|location| {
            let Some(position) = location.position() else {
                warn!(id = %location.id, "skipping location with invalid coordinates");
                return None;
            };

            let mut properties = JsonObject::new();
            properties.insert("name".into(), JsonValue::from(location.name.clone()));
            properties.insert("category".into(), JsonValue::from(location.category.clone()));
            properties.insert("rating".into(), JsonValue::from(location.rating_text()));

            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![position.lon, position.lat]))),
                id: Some(geojson::feature::Id::String(location.id.to_string())),
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn to_geojson_string(collection: &FeatureCollection) -> String {
    serde_json::to_string(collection).unwrap_or_else(|e| {
        warn!(error = %e, "failed to serialize map features");
        String::new()
    })
}
