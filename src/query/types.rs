use crate::index::types::IndexError;
use crate::registry::types::{ServiceError, ServiceSummary};

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Raw query string of `GET /{service}/`. Values stay strings so missing and
/// malformed parameters can be told apart.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WithinParams {
    pub radius: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub sort: Option<String>,
}

/// A validated radius query.
#[derive(Debug, Clone, PartialEq)]
pub struct WithinQuery {
    /// Meters, already clamped to the service maximum.
    pub radius: f64,
    pub lat: f64,
    pub lng: f64,
    pub sort: String,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(r#"Missing parameters: "radius", "lat" and "lng" must be specified."#)]
    MissingParameters,
    #[error("Invalid parameter {name:?}: {value:?} is not a number")]
    InvalidParameter { name: &'static str, value: String },
    #[error("{0}")]
    Service(#[from] ServiceError),
    #[error("Service error")]
    Index(#[from] IndexError),
    #[error("Service error")]
    Task(#[from] tokio::task::JoinError),
}

impl QueryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::MissingParameters | QueryError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            QueryError::Service(ServiceError::NotFound | ServiceError::NotReady) => {
                StatusCode::NOT_FOUND
            }
            // Entry lookups report a missing id as a server error, like every
            // other index failure.
            QueryError::Service(ServiceError::Unavailable)
            | QueryError::Index(_)
            | QueryError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            QueryError::Index(e) => tracing::warn!("Index query failed: {}", e),
            QueryError::Task(e) => tracing::error!("Query task failed: {}", e),
            _ => tracing::debug!("Rejected query: {}", self),
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub services: BTreeMap<String, ServiceSummary>,
}
