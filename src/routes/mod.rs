pub mod auth;
pub mod profile;
pub mod settings;
pub mod social;

use std::time::Duration;

use axum::http::{header, HeaderName, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::token::SESSION_HEADER;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The full API with tracing and CORS applied.
pub fn app(state: AppState) -> Router {
    let session = HeaderName::from_static(SESSION_HEADER);
    // Browsers only see renewed tokens if the header is exposed.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, session.clone()])
        .expose_headers([session])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(profile::router(&state))
        .merge(social::router(&state))
        .merge(settings::router(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Target of id-taking routes called without an id.
async fn missing_id() -> AppResult<()> {
    Err(AppError::BadRequest("No ID provided".into()))
}
