use almanac_common::{params::EventDraft, views::Event};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{models::DbUlid, schema::events};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = events, check_for_backend(diesel::pg::Pg))]
pub struct DbEvent {
    pub id: DbUlid,

    /// The user who created the event and the only one who may see it.
    pub owner_id: DbUlid,

    pub title: String,
    pub description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbEvent {
    pub fn new(owner_id: DbUlid, draft: EventDraft) -> Self {
        let now = Utc::now();
        Self {
            id: DbUlid::new(),
            owner_id,
            title: draft.title,
            description: draft.description,
            start_at: draft.start_at,
            end_at: draft.end_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// The editable part of this event.
    pub fn draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            start_at: self.start_at,
            end_at: self.end_at,
        }
    }
}

impl From<DbEvent> for Event {
    fn from(value: DbEvent) -> Self {
        Self {
            id: value.id.into(),
            owner_id: value.owner_id.into(),
            title: value.title,
            description: value.description,
            start_at: value.start_at,
            end_at: value.end_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = events)]
pub struct DbEventChanges {
    pub title: String,
    pub description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventDraft> for DbEventChanges {
    fn from(draft: EventDraft) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            start_at: draft.start_at,
            end_at: draft.end_at,
            updated_at: Utc::now(),
        }
    }
}

impl DbEventChanges {
    pub fn apply_to(&self, event: &mut DbEvent) {
        event.title = self.title.clone();
        event.description = self.description.clone();
        event.start_at = self.start_at;
        event.end_at = self.end_at;
        event.updated_at = self.updated_at;
    }
}
