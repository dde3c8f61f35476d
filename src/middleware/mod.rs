use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    utils::{extractors::extract_token, jwt},
};

/// Rejects requests without a valid admin token and exposes the claims to
/// handlers as a request extension.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;
    let claims = jwt::verify_token(&state.config.auth.jwt_secret, token)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
