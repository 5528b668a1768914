use super::engine::{get_entry, within};
use super::types::{ErrorBody, HealthResponse, QueryError, WithinParams};
use crate::ingestion::types::{Feature, FeatureCollection};
use crate::registry::registry::ServiceRegistry;

use axum::extract::{Path, Query};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::map_response;
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router};
use std::sync::Arc;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP surface of the query service.
pub fn routes(registry: Arc<ServiceRegistry>) -> Router {
    Router::new()
        .route("/", get(handle_health))
        .route("/:service", get(handle_within))
        .route("/:service/", get(handle_within))
        .route("/:service/:entry_id", get(handle_get_entry))
        .fallback(handle_unknown_route)
        .layer(map_response(set_json_content_type))
        .layer(Extension(registry))
}

pub async fn handle_health(
    Extension(registry): Extension<Arc<ServiceRegistry>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        services: registry.summaries(),
    })
}

pub async fn handle_within(
    Path(service): Path<String>,
    Query(params): Query<WithinParams>,
    Extension(registry): Extension<Arc<ServiceRegistry>>,
) -> Result<Json<FeatureCollection>, QueryError> {
    let collection = within(&registry, &service, &params).await?;
    Ok(Json(collection))
}

pub async fn handle_get_entry(
    Path((service, entry_id)): Path<(String, String)>,
    Extension(registry): Extension<Arc<ServiceRegistry>>,
) -> Result<Json<Feature>, QueryError> {
    let feature = get_entry(&registry, &service, &entry_id).await?;
    Ok(Json(feature))
}

async fn handle_unknown_route() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_string(),
        }),
    )
}

async fn set_json_content_type(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}
