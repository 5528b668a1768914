//! Query Pipeline
//!
//! Resolves the service, runs the index call on the blocking pool, and shapes
//! the result. The index is resolved per call and never held between calls.

use super::distance::{circle_shapes, haversine_m};
use super::sort::sort_by_property;
use super::types::{QueryError, WithinParams, WithinQuery};
use crate::config::types::ServiceConfig;
use crate::index::spatial::SpatialIndex;
use crate::index::types::IndexError;
use crate::ingestion::types::{Feature, FeatureCollection};
use crate::registry::registry::{ServiceHandle, ServiceRegistry};

use serde_json::Value;

pub const CIRCLE_VERTICES: usize = 32;
pub const DEFAULT_SORT_KEY: &str = "dist";
pub const DISTANCE_PROPERTY: &str = "dist";

impl WithinQuery {
    /// Validates raw parameters against the service limits.
    ///
    /// The radius is truncated to whole meters and clamped to
    /// `[0, config.max_radius]`.
    pub fn parse(params: &WithinParams, config: &ServiceConfig) -> Result<Self, QueryError> {
        let (Some(radius), Some(lat), Some(lng)) = (&params.radius, &params.lat, &params.lng)
        else {
            return Err(QueryError::MissingParameters);
        };

        let radius = number("radius", radius)?.trunc();
        let lat = number("lat", lat)?;
        let lng = number("lng", lng)?;

        Ok(Self {
            radius: radius.clamp(0.0, config.max_radius),
            lat,
            lng,
            sort: params
                .sort
                .clone()
                .unwrap_or_else(|| DEFAULT_SORT_KEY.to_string()),
        })
    }
}

fn number(name: &'static str, value: &str) -> Result<f64, QueryError> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(QueryError::InvalidParameter {
            name,
            value: value.to_string(),
        }),
    }
}

/// `GET /{service}/?radius&lat&lng&sort`
pub async fn within(
    registry: &ServiceRegistry,
    service: &str,
    params: &WithinParams,
) -> Result<FeatureCollection, QueryError> {
    let handle = registry.lookup(service)?;
    let query = WithinQuery::parse(params, &handle.config)?;
    let max_results = handle.config.max_results;

    let shapes = circle_shapes(query.lng, query.lat, query.radius, CIRCLE_VERTICES);
    let mut features =
        query_index(registry, service, handle, move |index| index.within_any(&shapes)).await?;

    annotate_distances(&mut features, query.lat, query.lng);
    sort_by_property(&mut features, &query.sort);
    features.truncate(max_results);

    tracing::debug!(
        "Service {} returned {} features for r={} at ({}, {})",
        service,
        features.len(),
        query.radius,
        query.lat,
        query.lng
    );
    Ok(FeatureCollection::new(features))
}

/// `GET /{service}/{entry_id}`
pub async fn get_entry(
    registry: &ServiceRegistry,
    service: &str,
    entry_id: &str,
) -> Result<Feature, QueryError> {
    let handle = registry.lookup(service)?;
    let id = entry_id.to_string();
    query_index(registry, service, handle, move |index| index.get(&id)).await
}

/// Runs `op` against the resolved index. If that index was retired and closed
/// between resolution and the call, resolves once more and retries on the
/// newly published index.
async fn query_index<T, F>(
    registry: &ServiceRegistry,
    service: &str,
    handle: ServiceHandle,
    op: F,
) -> Result<T, QueryError>
where
    T: Send + 'static,
    F: Fn(&SpatialIndex) -> Result<T, IndexError> + Clone + Send + 'static,
{
    let mut index = handle.index;

    for attempt in 0..2 {
        let op = op.clone();
        let current = index.clone();
        let result = tokio::task::spawn_blocking(move || op(&current)).await?;

        match result {
            Err(IndexError::Closed(store)) if attempt == 0 => {
                tracing::debug!("Index {} retired mid-query, retrying {}", store, service);
                index = registry.resolve(service)?.index;
            }
            other => return Ok(other?),
        }
    }

    Err(QueryError::Index(IndexError::Closed(index.name().to_string())))
}

/// Sets `properties.dist` to the distance in meters from `(lat, lng)` to each
/// feature's first coordinate.
pub fn annotate_distances(features: &mut [Feature], lat: f64, lng: f64) {
    for feature in features {
        let Some((f_lng, f_lat)) = feature.geometry.first_position() else {
            continue;
        };
        let dist = haversine_m(lat, lng, f_lat, f_lng);
        if let Some(value) = serde_json::Number::from_f64(dist) {
            feature
                .properties
                .insert(DISTANCE_PROPERTY.to_string(), Value::Number(value));
        }
    }
}
