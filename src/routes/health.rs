use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    AppState, database,
    error::{AppError, Result},
};

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Ready once the database answers and the upload directory is reachable.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse> {
    database::check_health(&state.db).await?;

    if !tokio::fs::try_exists(state.uploads.root()).await? {
        return Err(AppError::InternalError(format!(
            "Upload directory {} is missing",
            state.uploads.root().display()
        )));
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "database": "connected",
            "uploads": "available"
        })),
    ))
}
