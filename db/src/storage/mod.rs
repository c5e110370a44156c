use almanac_common::{
    caller::Caller,
    params::{EventDraft, ParamsError, UpdateEventParams},
    range::DateWindow,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use ulid::Ulid;

use crate::models::{DbAuthToken, DbEvent, DbUlid, DbUser, DbUserChanges};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Query Error: {0}")]
    Query(#[source] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error(transparent)]
    Invalid(#[from] ParamsError),
}

#[async_trait]
pub trait Storage: UserStore + EventStore + TokenStore + Send + Sync + 'static {
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Fields of a user that does not exist yet. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewLocalUser {
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore {
    /// Fetch a user. A `User` caller can only see itself.
    async fn get(&self, caller: &Caller, id: Ulid) -> Result<Option<DbUser>, StoreError>;

    /// Look a user up by (normalized) email. System callers only.
    async fn get_by_email(&self, caller: &Caller, email: &str)
    -> Result<Option<DbUser>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_local(&self, caller: &Caller, user: NewLocalUser)
    -> Result<DbUser, StoreError>;

    async fn update(
        &self,
        caller: &Caller,
        id: Ulid,
        changes: DbUserChanges,
    ) -> Result<DbUser, StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    /// Only events whose interval overlaps this window.
    pub window: Option<DateWindow>,
}

/// Event persistence, always scoped to the calling user.
///
/// Event ids are taken as the raw strings clients send; an id that does not
/// parse behaves exactly like one that does not exist, as does an event
/// owned by someone else.
#[async_trait]
pub trait EventStore {
    async fn get(&self, caller: &Caller, id: &str) -> Result<Option<DbEvent>, StoreError>;

    /// Ordered by start time, then id.
    async fn list(&self, caller: &Caller, filter: EventFilter)
    -> Result<Vec<DbEvent>, StoreError>;

    async fn create(&self, caller: &Caller, draft: EventDraft) -> Result<DbEvent, StoreError>;

    /// Overwrite the editable fields of an event.
    async fn update(
        &self,
        caller: &Caller,
        id: &str,
        draft: EventDraft,
    ) -> Result<DbEvent, StoreError>;

    /// Merge `changes` onto the stored event and write the result back as
    /// one atomic step. Fails with `Invalid` if the merged event does not
    /// validate.
    async fn patch(
        &self,
        caller: &Caller,
        id: &str,
        changes: UpdateEventParams,
    ) -> Result<DbEvent, StoreError>;

    async fn delete(&self, caller: &Caller, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TokenStore {
    async fn create_token(
        &self,
        user_id: Ulid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<DbAuthToken, StoreError>;

    /// The token with this hash and the user it belongs to.
    async fn resolve_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<(DbAuthToken, DbUser)>, StoreError>;

    /// Record that the token was just used.
    async fn touch_token(&self, token_hash: &str) -> Result<(), StoreError>;

    async fn revoke_token(&self, token_hash: &str) -> Result<(), StoreError>;
}

/// The user whose events `caller` may touch.
pub(crate) fn event_owner(caller: &Caller) -> Result<DbUlid, StoreError> {
    caller
        .require_user()
        .map(DbUlid::from)
        .map_err(|_| StoreError::PermissionDenied)
}

pub(crate) fn may_access_user(caller: &Caller, id: Ulid) -> bool {
    match caller {
        Caller::System => true,
        Caller::User { id: own, .. } => *own == id,
    }
}
