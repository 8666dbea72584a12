use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::accounts::service::Authenticated;
use crate::accounts::validation::{LoginRequest, RegisterRequest};
use crate::auth::middleware::session_header;
use crate::error::AppResult;
use crate::extractors::ApiJson;
use crate::state::AppState;

fn clear_session_cookie() -> String {
    "session=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0".to_string()
}

fn with_session(message: &str, auth: Authenticated) -> AppResult<Response> {
    let session = session_header(&auth.token)?;
    Ok((
        StatusCode::OK,
        [session],
        Json(json!({ "message": message, "user": auth.user })),
    )
        .into_response())
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<Response> {
    let auth = state.accounts.register(req).await?;
    with_session("Registration successful", auth)
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Response> {
    let auth = state.accounts.login(req).await?;
    tracing::info!(user_id = %auth.user.id, "Login successful");
    with_session("Login successful.", auth)
}

/// POST /api/logout. Tokens are stateless, so this only clears any cookie copy.
pub async fn logout() -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({ "message": "Logout successful." })),
    )
        .into_response()
}
