use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{
    error::AppError,
    models::{CreateEntryRequest, Entry, SearchParams},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/entries", get(search_entries).post(create_entry))
        .route("/api/entries/old", delete(prune_entries))
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure of one endpoint. Validation problems keep their own message; storage
/// problems are reported under the endpoint's message.
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: message.into(),
                details: None,
            },
        }
    }

    fn from_app(err: AppError, message: &str, with_details: bool) -> Self {
        if err.is_validation() {
            warn!(error = %err, "rejected request");
            return Self::bad_request(err.to_string());
        }
        error!(error = %err, "{message}");
        Self {
            status: err.status(),
            body: ErrorBody {
                error: message.to_string(),
                details: with_details.then(|| err.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn create_entry(
    State(state): State<AppState>,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    debug!(?request, "received entry");
    let entry = state
        .engine
        .create(request)
        .await
        .map_err(|err| ApiError::from_app(err, "Failed to add entry", true))?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn search_entries(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let entries = state
        .engine
        .search(&params)
        .await
        .map_err(|err| ApiError::from_app(err, "Failed to retrieve entries", false))?;
    Ok(Json(entries))
}

#[derive(Debug, Serialize)]
pub struct PruneSummary {
    pub message: String,
}

async fn prune_entries(State(state): State<AppState>) -> Result<Json<PruneSummary>, ApiError> {
    let deleted = state
        .engine
        .prune_stale()
        .await
        .map_err(|err| ApiError::from_app(err, "Failed to delete old entries", false))?;
    Ok(Json(PruneSummary {
        message: format!("{deleted} entries deleted."),
    }))
}
