use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::FieldErrors;
use crate::extractors::RequestBody;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const EMAIL_MAX: usize = 35;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 45;
pub const FIRSTNAME_MAX: usize = 18;
pub const LASTNAME_MAX: usize = 50;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUsernameRequest {
    pub username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// Collects the first failing rule per field.
#[derive(Default)]
struct Rules {
    errors: FieldErrors,
}

impl Rules {
    fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "This field is required.".to_string());
        }
        self
    }

    fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        if let Some(message) = length_error(value, min, max) {
            self.fail(field, message);
        }
        self
    }

    fn raw_length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        if let Some(message) = raw_length_error(value, min, max) {
            self.fail(field, message);
        }
        self
    }

    fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_email(value) {
            self.fail(field, "This field must be a valid email address.".to_string());
        }
        self
    }

    fn fail(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_insert(message);
    }

    fn finish(&mut self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

/// Length bounds counted in characters of the trimmed value. `None` when the value fits.
pub fn length_error(value: &str, min: usize, max: usize) -> Option<String> {
    bounds_error(value.trim().chars().count(), min, max)
}

/// Like [`length_error`] but counts every character, for values stored untrimmed.
pub fn raw_length_error(value: &str, min: usize, max: usize) -> Option<String> {
    bounds_error(value.chars().count(), min, max)
}

fn bounds_error(len: usize, min: usize, max: usize) -> Option<String> {
    if len < min {
        Some(format!("This field must be at least {} characters.", min))
    } else if len > max {
        Some(format!("This field must be at most {} characters.", max))
    } else {
        None
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

impl RequestBody for RegisterRequest {
    const FIELDS: &'static [&'static str] =
        &["username", "email", "password", "firstname", "lastname"];

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut rules = Rules::default();
        rules
            .required("username", &self.username)
            .length("username", &self.username, USERNAME_MIN, USERNAME_MAX)
            .required("email", &self.email)
            .email("email", &self.email)
            .length("email", &self.email, 0, EMAIL_MAX)
            .required("password", &self.password)
            .raw_length("password", &self.password, PASSWORD_MIN, PASSWORD_MAX)
            .required("firstname", &self.firstname)
            .length("firstname", &self.firstname, 0, FIRSTNAME_MAX)
            .required("lastname", &self.lastname)
            .length("lastname", &self.lastname, 0, LASTNAME_MAX);
        rules.finish()
    }
}

impl RequestBody for LoginRequest {
    const FIELDS: &'static [&'static str] = &["username", "email", "password"];
    const REJECT_UNKNOWN: bool = true;

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut rules = Rules::default();
        rules.required("password", &self.password);
        if !self.email.trim().is_empty() {
            rules.email("email", &self.email);
        }
        rules.finish()
    }
}

// Emptiness and length are checked by the account service so the messages match the
// update endpoints' contract.
impl RequestBody for UpdateUsernameRequest {
    const FIELDS: &'static [&'static str] = &["username"];
}

impl RequestBody for UpdatePasswordRequest {
    const FIELDS: &'static [&'static str] = &["password"];
}
