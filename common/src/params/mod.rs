//! Input parameters for the various functions within Almanac.
//!
//! Request bodies are deserialized into these types and then validated with
//! their `validate`/`apply` methods before reaching storage.

use thiserror::Error;

mod auth;
pub use auth::*;

mod event;
pub use event::*;

mod range;
pub use range::*;

mod user;
pub use user::*;

/// A request parameter failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ParamsError {
    /// Name of the offending field, as it appears on the wire.
    pub field: &'static str,

    /// Human-readable description of what is wrong with it.
    pub reason: String,
}

impl ParamsError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub(crate) fn non_blank(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ParamsError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParamsError::new(field, "This field may not be blank."));
    }
    if value.chars().count() > max_chars {
        return Err(ParamsError::new(
            field,
            format!("Ensure this field has no more than {max_chars} characters."),
        ));
    }
    Ok(value.to_string())
}
