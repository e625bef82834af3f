use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::error::PagesmithError;
use crate::model::version::{NewVersion, VersionRecord};

use super::AppState;

/// Maps store errors onto HTTP statuses.
pub struct ApiError(PagesmithError);

impl From<PagesmithError> for ApiError {
    fn from(err: PagesmithError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PagesmithError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PagesmithError::ChainConflict { .. } => StatusCode::CONFLICT,
            PagesmithError::InvalidRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "version store request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.api_token else {
        return Ok(());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(PagesmithError::Unauthorized("missing or invalid bearer token".to_string()).into())
    }
}

pub async fn get_head(
    State(state): State<AppState>,
    Path(site): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Option<VersionRecord>>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.store.head(&site).await?))
}

pub async fn list_versions(
    State(state): State<AppState>,
    Path(site): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<VersionRecord>>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.store.list(&site).await?))
}

pub async fn append_version(
    State(state): State<AppState>,
    Path(site): Path<String>,
    headers: HeaderMap,
    Json(version): Json<NewVersion>,
) -> Result<(StatusCode, Json<VersionRecord>), ApiError> {
    authorize(&state, &headers)?;
    let record = state.store.append(&site, version).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
