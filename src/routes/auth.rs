use axum::{Extension, Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AdminResponse, AuthResponse, LoginRequest},
    queries::admin_queries,
    utils::{
        extractors::AppJson,
        jwt::{self, Claims},
    },
};

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let admin = admin_queries::find_by_username(&state.db, payload.username.trim())
        .await?
        .ok_or_else(invalid)?;

    let is_valid = bcrypt::verify(&payload.password, &admin.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    if !is_valid {
        tracing::warn!("Failed login attempt for {}", admin.username);
        return Err(invalid());
    }

    let auth = &state.config.auth;
    let token = jwt::generate_token(
        &auth.jwt_secret,
        admin.id,
        &admin.username,
        auth.token_ttl_hours,
    )?;

    tracing::info!("Admin {} logged in", admin.username);

    Ok(Json(AuthResponse { token }))
}

pub async fn current_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AdminResponse>> {
    let admin = admin_queries::find_by_id(&state.db, claims.admin_id()?)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Token is not valid".to_string()))?;

    Ok(Json(admin.into()))
}
