use std::sync::Arc;

use crate::accounts::repository::UserRepository;
use crate::accounts::validation::{
    length_error, raw_length_error, LoginRequest, RegisterRequest, PASSWORD_MAX, PASSWORD_MIN,
    USERNAME_MAX, USERNAME_MIN,
};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenService;
use crate::db::error::RepositoryError;
use crate::db::models::{NewUser, UserProfile};
use crate::error::{AppError, AppResult, FieldErrors};

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: UserProfile,
    pub token: String,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<Authenticated> {
        let password_hash = hash_password(req.password, self.bcrypt_cost).await?;

        let new_user = NewUser {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash,
            firstname: req.firstname.trim().to_string(),
            lastname: req.lastname.trim().to_string(),
        };

        let user = self.users.insert(new_user).await.map_err(|e| match e {
            RepositoryError::UniqueViolation { column } => registration_conflict(&column),
            other => other.into(),
        })?;

        let token = self.tokens.issue(user.id.as_str())?;
        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");

        Ok(Authenticated {
            user: user.into(),
            token,
        })
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<Authenticated> {
        let username = req.username.trim();
        let email = req.email.trim();

        let user = if !username.is_empty() {
            self.users.find_by_username(username).await?
        } else if !email.is_empty() {
            self.users.find_by_email(email).await?
        } else {
            return Err(AppError::BadRequest(
                "Either 'username' or 'email' is required.".into(),
            ));
        };

        let Some(user) = user else {
            tracing::warn!(username, email, "Login for unknown user");
            return Err(AppError::Unauthorized("User not found.".into()));
        };

        if !verify_password(req.password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.id, "Login with wrong password");
            return Err(AppError::Unauthorized("Wrong password".into()));
        }

        let token = self.tokens.issue(user.id.as_str())?;

        Ok(Authenticated {
            user: user.into(),
            token,
        })
    }

    pub async fn profile(&self, user_id: &str) -> AppResult<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(user_not_found)
    }

    pub async fn update_username(&self, user_id: &str, username: &str) -> AppResult<String> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("New username cannot be empty.".into()));
        }
        if let Some(message) = length_error(username, USERNAME_MIN, USERNAME_MAX) {
            return Err(field_error("username", message));
        }

        let updated = self
            .users
            .update_username(user_id, username)
            .await
            .map_err(|e| match e {
                RepositoryError::UniqueViolation { .. } => {
                    AppError::Conflict("Username is already taken.".into())
                }
                other => other.into(),
            })?;
        if !updated {
            return Err(user_not_found());
        }

        tracing::info!(user_id, username, "Username updated");
        Ok(username.to_string())
    }

    pub async fn update_password(&self, user_id: &str, password: &str) -> AppResult<()> {
        if password.is_empty() {
            return Err(AppError::BadRequest("New password cannot be empty".into()));
        }
        if let Some(message) = raw_length_error(password, PASSWORD_MIN, PASSWORD_MAX) {
            return Err(field_error("password", message));
        }

        let hash = hash_password(password.to_string(), self.bcrypt_cost).await?;
        if !self.users.update_password_hash(user_id, &hash).await? {
            return Err(user_not_found());
        }

        tracing::info!(user_id, "Password updated");
        Ok(())
    }
}

fn registration_conflict(column: &str) -> AppError {
    let message = match column {
        "email" => "The user already exists. Please try another email.",
        "username" => "The user already exists. Please try another username.",
        _ => "The user already exists. Please try another username or email.",
    };
    AppError::Conflict(message.into())
}

fn field_error(field: &str, message: String) -> AppError {
    let mut errors = FieldErrors::new();
    errors.insert(field.to_string(), message);
    AppError::Validation(errors)
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found.".into())
}
