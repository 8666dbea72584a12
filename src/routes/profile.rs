use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::AuthPolicy;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let own = Router::new().route("/api/profile", get(own_profile));
    let public = Router::new().route("/api/profile/{id}", get(public_profile));

    AuthPolicy::Required
        .apply(own, state)
        .merge(AuthPolicy::Optional.apply(public, state))
}

/// GET /api/profile
async fn own_profile(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Value>> {
    let profile = state.accounts.profile(&user.id).await?;
    Ok(Json(json!({
        "message": format!("{} Profile", profile.username),
        "user": profile,
    })))
}

/// GET /api/profile/{id}. Anyone may look; a bad token is still rejected.
async fn public_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _viewer: MaybeUser,
) -> AppResult<Json<Value>> {
    let profile = state.social.public_profile(&id).await?;
    Ok(Json(json!({
        "message": format!("{} Profile", profile.username),
        "user": profile,
    })))
}
