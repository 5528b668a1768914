//! Query Module
//!
//! Answers radius queries and entry lookups against the currently published
//! index of a service.
//!
//! ## Pipeline
//! - **Validation**: `radius`, `lat` and `lng` must be present and numeric; the radius is
//!   clamped to the service's configured maximum.
//! - **Lookup**: A 32-vertex polygon approximating the circle is handed to the index's
//!   containment query. Circles crossing the antimeridian also query a copy shifted
//!   by 360°, so both sides of ±180 are covered.
//! - **Annotation**: Each hit gets a `dist` property, the great-circle distance in meters.
//! - **Ranking**: Stable sort by the requested property (missing values last), then
//!   truncation to the service's result limit.
//!
//! ## Submodules
//! - **`distance`**: Haversine distance and the circle polygon.
//! - **`sort`**: Typed comparator over property values.
//! - **`engine`**: The pipeline itself.
//! - **`handlers`**: Axum handlers and the HTTP router.
//! - **`types`**: Request parameters and the query error type.

pub mod distance;
pub mod engine;
pub mod handlers;
pub mod sort;
pub mod types;
