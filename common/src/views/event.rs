use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use utoipa::ToSchema;

use crate::range::{DateWindow, Granularity, RangeError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// The unique identifier for this event.
    pub id: Ulid,

    /// The user who created, and solely owns, this event.
    pub owner_id: Ulid,

    pub title: String,
    pub description: String,

    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller's events overlapping a day, week, month or year.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventRange {
    pub granularity: Granularity,

    /// The date the window was computed from.
    pub reference_date: NaiveDate,

    /// Inclusive start of the window.
    pub start: DateTime<Utc>,

    /// Exclusive end of the window.
    pub end: DateTime<Utc>,

    /// Every matching event, ordered by start time then id.
    pub items: Vec<Event>,

    /// The same events broken down per calendar day of the window. An event
    /// spanning several days appears under each of them.
    pub days: Vec<DaySchedule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DaySchedule {
    pub day: NaiveDate,
    pub events: Vec<Event>,
}

impl EventRange {
    /// Assemble a listing from events already filtered to `window`.
    pub fn build(
        granularity: Granularity,
        reference_date: NaiveDate,
        window: &DateWindow,
        items: Vec<Event>,
    ) -> Result<Self, RangeError> {
        let days = window
            .split_days(&items, |e| (e.start_at, e.end_at))?
            .into_iter()
            .map(|(day, events)| DaySchedule { day, events })
            .collect();

        Ok(Self {
            granularity,
            reference_date,
            start: window.start,
            end: window.end,
            items,
            days,
        })
    }
}
