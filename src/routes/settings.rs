use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::accounts::validation::{UpdatePasswordRequest, UpdateUsernameRequest};
use crate::auth::AuthPolicy;
use crate::error::AppResult;
use crate::extractors::{ApiJson, CurrentUser};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/api/update-username", post(update_username))
        .route("/api/update-password", post(update_password));

    AuthPolicy::Required.apply(routes, state)
}

/// POST /api/update-username
async fn update_username(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<UpdateUsernameRequest>,
) -> AppResult<Json<Value>> {
    let username = state.accounts.update_username(&user.id, &req.username).await?;
    Ok(Json(json!({
        "message": "Username updated successfully",
        "newUsername": username,
    })))
}

/// POST /api/update-password
async fn update_password(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<UpdatePasswordRequest>,
) -> AppResult<Json<Value>> {
    state.accounts.update_password(&user.id, &req.password).await?;
    Ok(Json(json!({ "message": "Password updated successfully." })))
}
