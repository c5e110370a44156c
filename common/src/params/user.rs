use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    MAX_DISPLAY_NAME_CHARS, ParamsError, check_password, non_blank, normalize_email,
};

/// Partial update of the caller's own profile. Omitted fields are left as-is.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateUserParams {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserParams {
    pub fn validate(self) -> Result<Self, ParamsError> {
        Ok(Self {
            display_name: self
                .display_name
                .map(|n| non_blank("display_name", &n, MAX_DISPLAY_NAME_CHARS))
                .transpose()?,
            email: self.email.map(|e| normalize_email(&e)).transpose()?,
            password: self.password.map(check_password).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none() && self.password.is_none()
    }
}
