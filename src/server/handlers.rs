//! Request handlers and their wire types.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sighting_locator::positioning::{PermissionState, PositionFix, ReportedPosition};
use sighting_locator::{ResolutionResult, ResolveError, SubdivisionRecord, Submission};

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    subdivisions: usize,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        subdivisions: state.resolver.catalog().len(),
    })
}

#[derive(Serialize)]
pub struct SubdivisionsResponse {
    subdivisions: Vec<SubdivisionRecord>,
}

/// Catalog listing for manual subdivision selection
pub async fn subdivisions_handler(State(state): State<Arc<AppState>>) -> Json<SubdivisionsResponse> {
    Json(SubdivisionsResponse {
        subdivisions: state.resolver.catalog().records().to_vec(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Upload,
    Live,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQueryParams {
    /// Manually selected subdivision
    subdivision: Option<String>,
    /// How the photo was acquired
    #[serde(default)]
    capture: CaptureMode,
    /// Device permission state as seen by the client
    permission: Option<PermissionState>,
    /// Client-side fix latitude
    lat: Option<f64>,
    /// Client-side fix longitude
    lon: Option<f64>,
    /// Client-side fix accuracy in metres
    accuracy: Option<f64>,
    /// When the client obtained the fix (RFC 3339); defaults to receipt time
    timestamp: Option<DateTime<Utc>>,
}

impl ResolveQueryParams {
    fn into_parts(self, body: Bytes) -> (Submission, ReportedPosition) {
        let fix = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(PositionFix {
                accuracy_m: self.accuracy,
                timestamp: self.timestamp.unwrap_or_else(Utc::now),
                ..PositionFix::new(lat, lon)
            }),
            _ => None,
        };

        // A fix without an explicit state implies the client had permission
        let permission = self.permission.unwrap_or(if fix.is_some() {
            PermissionState::Granted
        } else {
            PermissionState::Unsupported
        });

        let submission = Submission {
            photo: (!body.is_empty()).then(|| body.to_vec()),
            live_capture: self.capture == CaptureMode::Live,
            manual_subdivision: self.subdivision,
        };

        (submission, ReportedPosition::new(permission, fix))
    }
}

/// Resolve the location of a single report. The body is the raw photo.
pub async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQueryParams>,
    body: Bytes,
) -> Result<Json<ResolutionResult>, (StatusCode, String)> {
    let (submission, positions) = params.into_parts(body);

    state
        .resolver
        .resolve(submission, &positions)
        .await
        .map(Json)
        .map_err(|e| match e {
            ResolveError::ManualSubdivisionRequired => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
        })
}
