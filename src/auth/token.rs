//! Stateless session tokens.
//!
//! Tokens are HS256 JWTs carrying `{sub, iat, exp}`. Expiry is checked here rather than
//! by `jsonwebtoken` so that a correctly signed but expired token can be told apart
//! from a forged one: the former is renewable, the latter never is.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Name of the request and response header carrying the token.
pub const SESSION_HEADER: &str = "session";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token subject must be a string or a UUID")]
    UnsupportedSubjectType,

    #[error("Token subject is empty")]
    EmptySubject,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is malformed")]
    Malformed,

    #[error("Token has expired")]
    Expired,

    #[error("Token TTL is out of range")]
    InvalidTtl,

    #[error("Failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Claims as they arrive in a verified token, before the subject is typed.
#[derive(Deserialize)]
struct SignedClaims {
    #[serde(default)]
    sub: serde_json::Value,
    iat: i64,
    exp: i64,
}

/// Who a token is issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Id(String),
    Uuid(Uuid),
}

impl Subject {
    fn into_claim(self) -> String {
        match self {
            Subject::Id(id) => id,
            Subject::Uuid(uuid) => uuid.to_string(),
        }
    }
}

impl From<&str> for Subject {
    fn from(id: &str) -> Self {
        Subject::Id(id.to_string())
    }
}

impl From<String> for Subject {
    fn from(id: String) -> Self {
        Subject::Id(id)
    }
}

impl From<Uuid> for Subject {
    fn from(uuid: Uuid) -> Self {
        Subject::Uuid(uuid)
    }
}

impl TryFrom<&serde_json::Value> for Subject {
    type Error = TokenError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(s) => Ok(Uuid::parse_str(s)
                .map(Subject::Uuid)
                .unwrap_or_else(|_| Subject::Id(s.clone()))),
            _ => Err(TokenError::UnsupportedSubjectType),
        }
    }
}

/// Result of a successful signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid(Claims),
    Expired(Claims),
}

impl TokenStatus {
    pub fn claims(&self) -> &Claims {
        match self {
            TokenStatus::Valid(claims) | TokenStatus::Expired(claims) => claims,
        }
    }

    pub fn subject(&self) -> &str {
        &self.claims().sub
    }
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::InvalidTtl)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        // `sub` is checked by `Subject::try_from` so non-string subjects get their own error
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn issue(&self, subject: impl Into<Subject>) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the clock read `issued_at`.
    pub fn issue_at(
        &self,
        subject: impl Into<Subject>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let sub = subject.into().into_claim();
        if sub.trim().is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let claims = Claims {
            sub,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    pub fn parse(&self, token: &str) -> Result<TokenStatus, TokenError> {
        self.parse_at(token, Utc::now())
    }

    pub fn parse_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenStatus, TokenError> {
        let raw = decode::<SignedClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?
            .claims;

        let claims = Claims {
            sub: Subject::try_from(&raw.sub)?.into_claim(),
            iat: raw.iat,
            exp: raw.exp,
        };
        if claims.is_expired_at(now) {
            Ok(TokenStatus::Expired(claims))
        } else {
            Ok(TokenStatus::Valid(claims))
        }
    }

    /// Subject of a currently valid token.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        match self.parse(token)? {
            TokenStatus::Valid(claims) if !claims.sub.is_empty() => Ok(claims.sub),
            TokenStatus::Valid(_) => Err(TokenError::EmptySubject),
            TokenStatus::Expired(_) => Err(TokenError::Expired),
        }
    }

    /// Mint a fresh token for the subject of an expired one.
    pub fn renew(&self, expired: &Claims) -> Result<String, TokenError> {
        self.issue(expired.sub.as_str())
    }
}
