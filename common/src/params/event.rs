use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ParamsError, non_blank};

pub const MAX_TITLE_CHARS: usize = 50;

/// The user-editable fields of an event, after validation.
///
/// Holding an `EventDraft` means the title is non-blank and
/// `start_at <= end_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl EventDraft {
    pub fn new(
        title: &str,
        description: String,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Result<Self, ParamsError> {
        let title = non_blank("title", title, MAX_TITLE_CHARS)?;

        if end_at < start_at {
            return Err(ParamsError::new(
                "end_at",
                "The event cannot end before it starts.",
            ));
        }

        Ok(Self {
            title,
            description,
            start_at,
            end_at,
        })
    }
}

/// Body for creating an event, and for replacing one with `PUT`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateEventParams {
    /// Short name of the event; at most 50 characters.
    pub title: String,

    /// Free-form notes about the event.
    #[serde(default)]
    pub description: String,

    /// When the event starts (RFC 3339).
    pub start_at: DateTime<Utc>,

    /// When the event ends (RFC 3339). Must not be before `start_at`.
    pub end_at: DateTime<Utc>,
}

impl CreateEventParams {
    pub fn validate(self) -> Result<EventDraft, ParamsError> {
        EventDraft::new(&self.title, self.description, self.start_at, self.end_at)
    }
}

/// Body for `PATCH`; only the supplied fields change.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateEventParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

impl UpdateEventParams {
    /// Merge onto `current`; the merged event must still validate.
    pub fn apply(self, current: EventDraft) -> Result<EventDraft, ParamsError> {
        EventDraft::new(
            self.title.as_deref().unwrap_or(&current.title),
            self.description.unwrap_or(current.description),
            self.start_at.unwrap_or(current.start_at),
            self.end_at.unwrap_or(current.end_at),
        )
    }
}
