use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{AppError, FieldErrors};

/// Represents the user a session token was issued to.
/// Inserted into request extensions by the session middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

/// Extractor that requires authentication.
/// Returns 401 if the session middleware did not attach a user.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("No token provided".into()))
    }
}

/// Optional user extractor: None instead of 401 when no session is attached.
pub struct MaybeUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<CurrentUser>().cloned()))
    }
}

/// A JSON request body with a fixed set of string fields.
pub trait RequestBody: DeserializeOwned {
    /// Lower-case names of the accepted fields. Keys are matched case-insensitively.
    const FIELDS: &'static [&'static str];

    /// Reject bodies carrying keys outside `FIELDS`.
    const REJECT_UNKNOWN: bool = false;

    fn validate(&self) -> Result<(), FieldErrors> {
        Ok(())
    }
}

/// JSON extractor producing the API's own decode and validation errors.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: RequestBody,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::Decode("Error decoding request body.".into()))?;
        decode_body(&bytes).map(ApiJson)
    }
}

pub fn decode_body<T: RequestBody>(bytes: &[u8]) -> Result<T, AppError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|_| AppError::Decode("Invalid JSON format".into()))?;
    let Value::Object(object) = value else {
        return Err(AppError::Decode("Request body must be a JSON object.".into()));
    };

    let mut normalized = Map::new();
    let mut unknown = Vec::new();
    for (key, value) in object {
        let field = key.to_ascii_lowercase();
        if !T::FIELDS.contains(&field.as_str()) {
            unknown.push(key);
            continue;
        }
        match &value {
            Value::String(_) => {}
            // null counts as absent
            Value::Null => continue,
            other => {
                return Err(AppError::Decode(format!(
                    "You cannot use the type {} in {}.",
                    json_type_name(other),
                    field
                )))
            }
        }
        normalized.insert(field, value);
    }

    if T::REJECT_UNKNOWN && !unknown.is_empty() {
        unknown.sort();
        return Err(AppError::UnknownFields(unknown));
    }

    let body: T = serde_json::from_value(Value::Object(normalized))
        .map_err(|e| AppError::Decode(e.to_string()))?;
    body.validate().map_err(AppError::Validation)?;
    Ok(body)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
