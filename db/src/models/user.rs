use almanac_common::{caller::Caller, views::User};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::{models::DbUlid, schema::users};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users, check_for_backend(diesel::pg::Pg))]
pub struct DbUser {
    pub id: DbUlid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub updated_at: DateTime<Utc>,
}

impl DbUser {
    /// Get the creation time of this user based on the ULID's timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.id.inner().datetime().into()
    }

    /// Convert this database user into the Caller its requests run as.
    pub fn to_caller(&self) -> Caller {
        Caller::User {
            id: *self.id.inner(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        Self {
            id: *value.id.inner(),
            created_at: value.created_at(),
            display_name: value.display_name,
            email: value.email,
            updated_at: value.updated_at,
        }
    }
}

/// Columns to overwrite on a user row. `None` leaves a column untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub struct DbUserChanges {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl DbUserChanges {
    pub fn apply_to(&self, user: &mut DbUser) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(display_name) = &self.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(password_hash) = &self.password_hash {
            user.password_hash = password_hash.clone();
        }
        user.updated_at = self.updated_at;
    }
}
