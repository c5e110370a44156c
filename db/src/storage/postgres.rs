use almanac_common::{
    caller::Caller,
    params::{EventDraft, UpdateEventParams},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    pg::Pg,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
    pooled_connection::{
        AsyncDieselConnectionManager, PoolError,
        bb8::{Pool, PooledConnection},
    },
    scoped_futures::ScopedFutureExt,
};
use tracing::{debug, instrument};
use ulid::Ulid;

use crate::{
    models::{DbAuthToken, DbEvent, DbEventChanges, DbUlid, DbUser, DbUserChanges},
    schema::{auth_tokens, events, users},
    storage::{
        EventFilter, EventStore, NewLocalUser, Storage, StoreError, TokenStore, UserStore,
        event_owner, may_access_user,
    },
};

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                StoreError::Constraint(info.message().to_string())
            }
            other => StoreError::Query(other),
        }
    }
}

impl From<bb8::RunError<PoolError>> for StoreError {
    fn from(err: bb8::RunError<PoolError>) -> Self {
        StoreError::Pool(err.to_string())
    }
}

/// PostgreSQL backend over a bb8 pool of diesel-async connections.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: Pool<AsyncPgConnection>,
}

impl PostgresStorage {
    /// Build the pool. Connections are opened lazily on first use, so this
    /// succeeds even when the database is unreachable.
    pub fn new(database_url: &str, max_connections: u32) -> Self {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = bb8::Pool::builder()
            .max_size(max_connections)
            .build_unchecked(manager);
        Self { pool }
    }

    async fn conn(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        diesel::sql_query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresStorage {
    #[instrument(skip(self))]
    async fn get(&self, caller: &Caller, id: Ulid) -> Result<Option<DbUser>, StoreError> {
        if !may_access_user(caller, id) {
            return Ok(None);
        }

        let mut conn = self.conn().await?;
        Ok(users::table
            .find(DbUlid::from(id))
            .select(DbUser::as_select())
            .first(&mut *conn)
            .await
            .optional()?)
    }

    #[instrument(skip(self))]
    async fn get_by_email(
        &self,
        caller: &Caller,
        email: &str,
    ) -> Result<Option<DbUser>, StoreError> {
        let mut conn = self.conn().await?;
        let user = users::table
            .filter(users::email.eq(email))
            .select(DbUser::as_select())
            .first(&mut *conn)
            .await
            .optional()?;

        Ok(user.filter(|u| may_access_user(caller, *u.id.inner())))
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_local(
        &self,
        _caller: &Caller,
        user: NewLocalUser,
    ) -> Result<DbUser, StoreError> {
        let row = DbUser {
            id: DbUlid::new(),
            email: user.email,
            display_name: user.display_name,
            password_hash: user.password_hash,
            updated_at: Utc::now(),
        };

        let mut conn = self.conn().await?;
        let created = diesel::insert_into(users::table)
            .values(&row)
            .returning(DbUser::as_returning())
            .get_result(&mut *conn)
            .await?;

        debug!(user_id = %created.id, "Created local user");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self,
        caller: &Caller,
        id: Ulid,
        changes: DbUserChanges,
    ) -> Result<DbUser, StoreError> {
        if !may_access_user(caller, id) {
            return Err(StoreError::NotFound);
        }

        let mut conn = self.conn().await?;
        diesel::update(users::table.find(DbUlid::from(id)))
            .set(&changes)
            .returning(DbUser::as_returning())
            .get_result(&mut *conn)
            .await
            .optional()?
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl EventStore for PostgresStorage {
    #[instrument(skip(self))]
    async fn get(&self, caller: &Caller, id: &str) -> Result<Option<DbEvent>, StoreError> {
        let owner = event_owner(caller)?;
        let Some(id) = DbUlid::from_string(id) else {
            return Ok(None);
        };

        let mut conn = self.conn().await?;
        Ok(events::table
            .filter(events::id.eq(id))
            .filter(events::owner_id.eq(owner))
            .select(DbEvent::as_select())
            .first(&mut *conn)
            .await
            .optional()?)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        caller: &Caller,
        filter: EventFilter,
    ) -> Result<Vec<DbEvent>, StoreError> {
        let owner = event_owner(caller)?;

        let mut query = events::table
            .filter(events::owner_id.eq(owner))
            .into_boxed::<Pg>();

        if let Some(window) = filter.window {
            query = query
                .filter(events::start_at.lt(window.end))
                .filter(events::end_at.ge(window.start));
        }

        let mut conn = self.conn().await?;
        Ok(query
            .select(DbEvent::as_select())
            .order_by((events::start_at.asc(), events::id.asc()))
            .load(&mut *conn)
            .await?)
    }

    #[instrument(skip(self, draft))]
    async fn create(&self, caller: &Caller, draft: EventDraft) -> Result<DbEvent, StoreError> {
        let row = DbEvent::new(event_owner(caller)?, draft);

        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(events::table)
            .values(&row)
            .returning(DbEvent::as_returning())
            .get_result(&mut *conn)
            .await?)
    }

    #[instrument(skip(self, draft))]
    async fn update(
        &self,
        caller: &Caller,
        id: &str,
        draft: EventDraft,
    ) -> Result<DbEvent, StoreError> {
        let owner = event_owner(caller)?;
        let id = DbUlid::from_string(id).ok_or(StoreError::NotFound)?;

        let mut conn = self.conn().await?;
        diesel::update(
            events::table
                .filter(events::id.eq(id))
                .filter(events::owner_id.eq(owner)),
        )
        .set(&DbEventChanges::from(draft))
        .returning(DbEvent::as_returning())
        .get_result(&mut *conn)
        .await
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, changes))]
    async fn patch(
        &self,
        caller: &Caller,
        id: &str,
        changes: UpdateEventParams,
    ) -> Result<DbEvent, StoreError> {
        let owner = event_owner(caller)?;
        let id = DbUlid::from_string(id).ok_or(StoreError::NotFound)?;

        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(move |conn| {
            async move {
                let current = events::table
                    .filter(events::id.eq(id))
                    .filter(events::owner_id.eq(owner))
                    .select(DbEvent::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or(StoreError::NotFound)?;

                let draft = changes.apply(current.draft())?;

                Ok(diesel::update(events::table.find(id))
                    .set(&DbEventChanges::from(draft))
                    .returning(DbEvent::as_returning())
                    .get_result(conn)
                    .await?)
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, caller: &Caller, id: &str) -> Result<(), StoreError> {
        let owner = event_owner(caller)?;
        let id = DbUlid::from_string(id).ok_or(StoreError::NotFound)?;

        let mut conn = self.conn().await?;
        let deleted = diesel::delete(
            events::table
                .filter(events::id.eq(id))
                .filter(events::owner_id.eq(owner)),
        )
        .execute(&mut *conn)
        .await?;

        match deleted {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TokenStore for PostgresStorage {
    #[instrument(skip(self, token_hash))]
    async fn create_token(
        &self,
        user_id: Ulid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<DbAuthToken, StoreError> {
        let row = DbAuthToken::new(user_id.into(), token_hash, expires_at);

        let mut conn = self.conn().await?;
        Ok(diesel::insert_into(auth_tokens::table)
            .values(&row)
            .returning(DbAuthToken::as_returning())
            .get_result(&mut *conn)
            .await?)
    }

    async fn resolve_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<(DbAuthToken, DbUser)>, StoreError> {
        let mut conn = self.conn().await?;
        Ok(auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::token_hash.eq(token_hash))
            .select((DbAuthToken::as_select(), DbUser::as_select()))
            .first(&mut *conn)
            .await
            .optional()?)
    }

    async fn touch_token(&self, token_hash: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        diesel::update(auth_tokens::table.filter(auth_tokens::token_hash.eq(token_hash)))
            .set(auth_tokens::last_used_at.eq(Utc::now()))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        diesel::delete(auth_tokens::table.filter(auth_tokens::token_hash.eq(token_hash)))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
