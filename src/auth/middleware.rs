use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    Router,
};

use crate::auth::token::{TokenStatus, SESSION_HEADER};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// How a group of routes treats the `session` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// No token handling at all.
    Public,
    /// A valid or renewable token attaches a user; no token passes through anonymously.
    Optional,
    /// A valid or renewable token is mandatory.
    Required,
}

impl AuthPolicy {
    /// Layer the policy onto every route already registered on `router`.
    pub fn apply(self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        match self {
            AuthPolicy::Public => router,
            AuthPolicy::Optional => {
                router.route_layer(middleware::from_fn_with_state(state.clone(), optional_session))
            }
            AuthPolicy::Required => {
                router.route_layer(middleware::from_fn_with_state(state.clone(), require_session))
            }
        }
    }
}

pub async fn require_session(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> AppResult<Response> {
    enforce(&state, AuthPolicy::Required, req, next).await
}

pub async fn optional_session(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> AppResult<Response> {
    enforce(&state, AuthPolicy::Optional, req, next).await
}

async fn enforce(
    state: &AppState,
    policy: AuthPolicy,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let header = req
        .headers()
        .get(SESSION_HEADER)
        .map(|value| value.to_str().map(|s| s.trim().to_string()))
        // an empty header counts as no token
        .filter(|token| !matches!(token, Ok(t) if t.is_empty()));

    let token = match header {
        Some(Ok(token)) => token,
        Some(Err(_)) => return Err(AppError::Unauthorized("Invalid token".into())),
        None if policy == AuthPolicy::Required => {
            return Err(AppError::Unauthorized("No token provided".into()))
        }
        None => return Ok(next.run(req).await),
    };

    let status = state.tokens.parse(&token)?;
    if status.subject().is_empty() {
        return Err(AppError::Unauthorized("Invalid token".into()));
    }

    let mut renewed = None;
    let user = match status {
        TokenStatus::Valid(claims) => CurrentUser { id: claims.sub },
        TokenStatus::Expired(claims) => {
            let fresh = state.tokens.renew(&claims)?;
            tracing::info!(subject = %claims.sub, "Renewed expired session token");
            renewed = Some(fresh);
            CurrentUser { id: claims.sub }
        }
    };

    req.extensions_mut().insert(user);
    let mut response = next.run(req).await;

    if let Some(fresh) = renewed {
        let (name, value) = session_header(&fresh)?;
        response.headers_mut().insert(name, value);
    }

    Ok(response)
}

/// The response header that hands a token to the client.
pub fn session_header(token: &str) -> AppResult<(HeaderName, HeaderValue)> {
    let value = HeaderValue::from_str(token)
        .map_err(|e| AppError::Internal(format!("Token is not a valid header value: {}", e)))?;
    Ok((HeaderName::from_static(SESSION_HEADER), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_header_uses_lowercase_name() {
        let (name, value) = session_header("abc.def.ghi").unwrap();
        assert_eq!(name.as_str(), "session");
        assert_eq!(value.to_str().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn control_characters_are_not_a_header_value() {
        assert!(matches!(
            session_header("bad\ntoken"),
            Err(AppError::Internal(_))
        ));
    }
}
