use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ParamsError, non_blank};

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_DISPLAY_NAME_CHARS: usize = 255;
pub const MAX_EMAIL_CHARS: usize = 255;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AuthLoginParams {
    /// The email address of the user to authenticate as.
    pub email: String,

    /// The password of the user to authenticate as.
    pub password: String,
}

/// Body of the registration endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateLocalUserParams {
    /// Email address used to log in. Must be unique.
    pub email: String,

    /// The user's display name.
    pub display_name: String,

    /// Plaintext password; at least 8 characters.
    pub password: String,
}

impl CreateLocalUserParams {
    /// Check every field and normalize the email address.
    pub fn validate(self) -> Result<Self, ParamsError> {
        Ok(Self {
            email: normalize_email(&self.email)?,
            display_name: non_blank("display_name", &self.display_name, MAX_DISPLAY_NAME_CHARS)?,
            password: check_password(self.password)?,
        })
    }
}

/// Lowercase and sanity-check an email address.
pub fn normalize_email(raw: &str) -> Result<String, ParamsError> {
    let email = non_blank("email", raw, MAX_EMAIL_CHARS)?.to_lowercase();

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ParamsError::new("email", "Enter a valid email address.")),
    }
}

pub fn check_password(password: String) -> Result<String, ParamsError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ParamsError::new(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_CHARS} characters."),
        ));
    }
    Ok(password)
}
