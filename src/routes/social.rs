use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::auth::AuthPolicy;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::missing_id;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let edges = Router::new()
        .route("/api/followuser/{id}", post(follow))
        .route("/api/unfollowuser/{id}", post(unfollow));
    let listing = Router::new().route("/api/getfollowers/{id}", get(followers));
    let without_id = Router::new()
        .route("/api/followuser", post(missing_id))
        .route("/api/unfollowuser", post(missing_id))
        .route("/api/getfollowers", get(missing_id));

    AuthPolicy::Required
        .apply(edges, state)
        .merge(AuthPolicy::Optional.apply(listing, state))
        .merge(AuthPolicy::Public.apply(without_id, state))
}

/// POST /api/followuser/{id}
async fn follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let success = state.social.follow(&user.id, &id).await?;
    Ok(Json(json!({ "success": success })))
}

/// POST /api/unfollowuser/{id}
async fn unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let success = state.social.unfollow(&user.id, &id).await?;
    Ok(Json(json!({ "success": success })))
}

/// GET /api/getfollowers/{id}
async fn followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _viewer: MaybeUser,
) -> AppResult<Json<Value>> {
    let followers = state.social.followers(&id).await?;
    Ok(Json(json!({ "followers": followers })))
}
