//! Ingestion Module Tests
//!
//! Covers GeoJSON decoding of source files and the geometry helpers used by
//! the index and the query pipeline.

#[cfg(test)]
mod tests {
    use crate::ingestion::reader::{SourceError, parse_features, read_source};
    use crate::ingestion::types::{Feature, FeatureCollection, Geometry, GeometryError};
    use serde_json::json;
    use std::path::Path;

    // ============================================================
    // PARSING
    // ============================================================

    #[test]
    fn test_parse_feature_collection() {
        let bytes = serde_json::to_vec(&json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "a", "geometry": {"type": "Point", "coordinates": [13.4, 52.5]}, "properties": {"name": "Berlin"}},
                {"type": "Feature", "id": 7, "geometry": {"type": "Point", "coordinates": [2.35, 48.85]}, "properties": {}}
            ]
        }))
        .unwrap();

        let features = parse_features(Path::new("test.json"), &bytes).unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].key(), Some("a".to_string()));
        assert_eq!(features[0].properties["name"], "Berlin");
        assert_eq!(features[1].key(), Some("7".to_string()));
    }

    #[test]
    fn test_parse_single_feature() {
        let bytes = br#"{"type": "Feature", "id": "solo", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}, "properties": null}"#;

        let features = parse_features(Path::new("solo.json"), bytes).unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].key(), Some("solo".to_string()));
        // null properties become an empty map
        assert!(features[0].properties.is_empty());
    }

    #[test]
    fn test_parse_missing_properties_defaults_to_empty() {
        let bytes = br#"{"type": "FeatureCollection", "features": [{"type": "Feature", "id": 1, "geometry": {"type": "Point", "coordinates": [0, 0]}}]}"#;

        let features = parse_features(Path::new("x.json"), bytes).unwrap();

        assert!(features[0].properties.is_empty());
    }

    #[test]
    fn test_parse_malformed_json() {
        let result = parse_features(Path::new("broken.json"), b"{ not json");

        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn test_parse_unknown_document_type() {
        let result = parse_features(Path::new("odd.json"), br#"{"type": "Topology", "objects": {}}"#);

        assert!(matches!(result, Err(SourceError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_source(&dir.path().join("does-not-exist.json")).await;

        match result {
            Err(SourceError::Unavailable { path, .. }) => {
                assert!(path.ends_with("does-not-exist.json"));
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    // ============================================================
    // FEATURE KEYS AND SERIALIZATION
    // ============================================================

    #[test]
    fn test_feature_key_rejects_non_scalar_ids() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature", "id": {"nested": true},
            "geometry": {"type": "Point", "coordinates": [0, 0]}
        }))
        .unwrap();

        assert_eq!(feature.key(), None);
    }

    #[test]
    fn test_feature_collection_serializes_geojson_shape() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature", "id": "p1",
            "geometry": {"type": "Point", "coordinates": [1.5, 2.5]},
            "properties": {"kind": "bench"}
        }))
        .unwrap();

        let value = serde_json::to_value(FeatureCollection::new(vec![feature])).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["id"], "p1");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(value["features"][0]["properties"]["kind"], "bench");
    }

    // ============================================================
    // GEOMETRY HELPERS
    // ============================================================

    #[test]
    fn test_first_position_of_point_and_polygon() {
        let point = Geometry::Point { coordinates: vec![10.0, 20.0] };
        assert_eq!(point.first_position(), Some((10.0, 20.0)));

        let polygon = Geometry::Polygon {
            coordinates: vec![vec![
                vec![1.0, 1.0],
                vec![2.0, 1.0],
                vec![2.0, 2.0],
                vec![1.0, 1.0],
            ]],
        };
        assert_eq!(polygon.first_position(), Some((1.0, 1.0)));
    }

    #[test]
    fn test_to_geo_rejects_short_positions() {
        let point = Geometry::Point { coordinates: vec![1.0] };
        assert_eq!(point.to_geo().unwrap_err(), GeometryError::ShortPosition);
    }

    #[test]
    fn test_to_geo_rejects_empty_geometry() {
        let line = Geometry::LineString { coordinates: vec![] };
        assert_eq!(line.to_geo().unwrap_err(), GeometryError::Empty);
    }

    #[test]
    fn test_to_geo_ignores_altitude() {
        let point = Geometry::Point { coordinates: vec![3.0, 4.0, 120.0] };

        match point.to_geo().unwrap() {
            geo::Geometry::Point(p) => {
                assert_eq!(p.x(), 3.0);
                assert_eq!(p.y(), 4.0);
            }
            other => panic!("expected a point, got {:?}", other),
        }
    }
}
