use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{models::DbUlid, schema::auth_tokens};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = auth_tokens, check_for_backend(diesel::pg::Pg))]
pub struct DbAuthToken {
    pub id: DbUlid,

    /// Reference to the user the token authenticates as
    pub user_id: DbUlid,

    /// SHA-256 of the token, hex encoded. The token itself is never stored.
    pub token_hash: String,

    /// When the token was issued
    pub created_at: DateTime<Utc>,

    /// Last time the token authenticated a request
    pub last_used_at: DateTime<Utc>,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl DbAuthToken {
    pub fn new(user_id: DbUlid, token_hash: String, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: DbUlid::new(),
            user_id,
            token_hash,
            created_at: now,
            last_used_at: now,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
