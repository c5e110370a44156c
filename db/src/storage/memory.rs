use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use almanac_common::{
    caller::Caller,
    params::{EventDraft, UpdateEventParams},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::{
    models::{DbAuthToken, DbEvent, DbEventChanges, DbUlid, DbUser, DbUserChanges},
    storage::{
        EventFilter, EventStore, NewLocalUser, Storage, StoreError, TokenStore, UserStore,
        event_owner, may_access_user,
    },
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<DbUlid, DbUser>,
    events: BTreeMap<DbUlid, DbEvent>,
    tokens: HashMap<String, DbAuthToken>,
}

/// Process-local backend with the same semantics as the Postgres one,
/// including the unique email and `end_at >= start_at` constraints.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage(Arc<RwLock<Tables>>);

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_event_range(event: &DbEvent) -> Result<(), StoreError> {
    if event.end_at < event.start_at {
        return Err(StoreError::Constraint("events_end_after_start".into()));
    }
    Ok(())
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn get(&self, caller: &Caller, id: Ulid) -> Result<Option<DbUser>, StoreError> {
        if !may_access_user(caller, id) {
            return Ok(None);
        }
        Ok(self.0.read().await.users.get(&DbUlid::from(id)).cloned())
    }

    async fn get_by_email(
        &self,
        caller: &Caller,
        email: &str,
    ) -> Result<Option<DbUser>, StoreError> {
        Ok(self
            .0
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email && may_access_user(caller, *u.id.inner()))
            .cloned())
    }

    async fn create_local(
        &self,
        _caller: &Caller,
        user: NewLocalUser,
    ) -> Result<DbUser, StoreError> {
        let mut tables = self.0.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }

        let row = DbUser {
            id: DbUlid::new(),
            email: user.email,
            display_name: user.display_name,
            password_hash: user.password_hash,
            updated_at: Utc::now(),
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        caller: &Caller,
        id: Ulid,
        changes: DbUserChanges,
    ) -> Result<DbUser, StoreError> {
        if !may_access_user(caller, id) {
            return Err(StoreError::NotFound);
        }

        let mut tables = self.0.write().await;
        let id = DbUlid::from(id);
        if let Some(email) = &changes.email {
            if tables.users.values().any(|u| &u.email == email && u.id != id) {
                return Err(StoreError::Conflict("users_email_key".into()));
            }
        }

        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        changes.apply_to(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl EventStore for MemoryStorage {
    async fn get(&self, caller: &Caller, id: &str) -> Result<Option<DbEvent>, StoreError> {
        let owner = event_owner(caller)?;
        let Some(id) = DbUlid::from_string(id) else {
            return Ok(None);
        };

        Ok(self
            .0
            .read()
            .await
            .events
            .get(&id)
            .filter(|e| e.owner_id == owner)
            .cloned())
    }

    async fn list(
        &self,
        caller: &Caller,
        filter: EventFilter,
    ) -> Result<Vec<DbEvent>, StoreError> {
        let owner = event_owner(caller)?;

        let mut events: Vec<DbEvent> = self
            .0
            .read()
            .await
            .events
            .values()
            .filter(|e| e.owner_id == owner)
            .filter(|e| {
                filter
                    .window
                    .is_none_or(|w| w.overlaps(e.start_at, e.end_at))
            })
            .cloned()
            .collect();

        events.sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn create(&self, caller: &Caller, draft: EventDraft) -> Result<DbEvent, StoreError> {
        let row = DbEvent::new(event_owner(caller)?, draft);
        check_event_range(&row)?;

        self.0.write().await.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        caller: &Caller,
        id: &str,
        draft: EventDraft,
    ) -> Result<DbEvent, StoreError> {
        let owner = event_owner(caller)?;
        let id = DbUlid::from_string(id).ok_or(StoreError::NotFound)?;

        let mut tables = self.0.write().await;
        let event = tables
            .events
            .get_mut(&id)
            .filter(|e| e.owner_id == owner)
            .ok_or(StoreError::NotFound)?;

        let mut updated = event.clone();
        DbEventChanges::from(draft).apply_to(&mut updated);
        check_event_range(&updated)?;

        *event = updated.clone();
        Ok(updated)
    }

    async fn patch(
        &self,
        caller: &Caller,
        id: &str,
        changes: UpdateEventParams,
    ) -> Result<DbEvent, StoreError> {
        let owner = event_owner(caller)?;
        let id = DbUlid::from_string(id).ok_or(StoreError::NotFound)?;

        // Held across read, merge and write.
        let mut tables = self.0.write().await;
        let event = tables
            .events
            .get_mut(&id)
            .filter(|e| e.owner_id == owner)
            .ok_or(StoreError::NotFound)?;

        let draft = changes.apply(event.draft())?;
        let mut updated = event.clone();
        DbEventChanges::from(draft).apply_to(&mut updated);
        check_event_range(&updated)?;

        *event = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, caller: &Caller, id: &str) -> Result<(), StoreError> {
        let owner = event_owner(caller)?;
        let id = DbUlid::from_string(id).ok_or(StoreError::NotFound)?;

        let mut tables = self.0.write().await;
        match tables.events.get(&id) {
            Some(e) if e.owner_id == owner => {
                tables.events.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryStorage {
    async fn create_token(
        &self,
        user_id: Ulid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<DbAuthToken, StoreError> {
        let mut tables = self.0.write().await;
        if !tables.users.contains_key(&DbUlid::from(user_id)) {
            return Err(StoreError::Constraint("auth_tokens_user_id_fkey".into()));
        }
        if tables.tokens.contains_key(&token_hash) {
            return Err(StoreError::Conflict("auth_tokens_token_hash_key".into()));
        }

        let row = DbAuthToken::new(user_id.into(), token_hash, expires_at);
        tables.tokens.insert(row.token_hash.clone(), row.clone());
        Ok(row)
    }

    async fn resolve_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<(DbAuthToken, DbUser)>, StoreError> {
        let tables = self.0.read().await;
        Ok(tables.tokens.get(token_hash).and_then(|token| {
            tables
                .users
                .get(&token.user_id)
                .map(|user| (token.clone(), user.clone()))
        }))
    }

    async fn touch_token(&self, token_hash: &str) -> Result<(), StoreError> {
        if let Some(token) = self.0.write().await.tokens.get_mut(token_hash) {
            token.last_used_at = Utc::now();
        }
        Ok(())
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<(), StoreError> {
        self.0.write().await.tokens.remove(token_hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use almanac_common::range::{DateWindow, Granularity};
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, d, h, 0, 0).unwrap()
    }

    fn draft(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> EventDraft {
        EventDraft::new(title, String::new(), start, end).unwrap()
    }

    async fn user(db: &MemoryStorage, email: &str) -> Caller {
        UserStore::create_local(
            db,
            &Caller::System,
            NewLocalUser {
                email: email.into(),
                display_name: email.into(),
                password_hash: "x".into(),
            },
        )
        .await
        .unwrap()
        .to_caller()
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let db = MemoryStorage::new();
        user(&db, "ada@example.com").await;

        let err = UserStore::create_local(
            &db,
            &Caller::System,
            NewLocalUser {
                email: "ada@example.com".into(),
                display_name: "Other".into(),
                password_hash: "y".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn users_only_see_themselves() {
        let db = MemoryStorage::new();
        let ada = user(&db, "ada@example.com").await;
        let bob = user(&db, "bob@example.com").await;
        let bob_id = bob.user_id().unwrap();

        assert!(UserStore::get(&db, &bob, bob_id).await.unwrap().is_some());
        assert!(UserStore::get(&db, &ada, bob_id).await.unwrap().is_none());
        assert!(UserStore::get(&db, &Caller::System, bob_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn events_are_scoped_to_their_owner() {
        let db = MemoryStorage::new();
        let ada = user(&db, "ada@example.com").await;
        let bob = user(&db, "bob@example.com").await;

        let event = EventStore::create(&db, &ada, draft("Standup", at(15, 9), at(15, 10)))
            .await
            .unwrap();
        let id = event.id.to_string();

        assert!(EventStore::get(&db, &ada, &id).await.unwrap().is_some());
        assert!(EventStore::get(&db, &bob, &id).await.unwrap().is_none());
        assert!(EventStore::list(&db, &bob, EventFilter::default()).await.unwrap().is_empty());

        let err = EventStore::update(&db, &bob, &id, draft("Hijack", at(15, 9), at(15, 10)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let err = EventStore::delete(&db, &bob, &id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        EventStore::delete(&db, &ada, &id).await.unwrap();
        assert!(EventStore::get(&db, &ada, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn system_caller_cannot_touch_events() {
        let db = MemoryStorage::new();
        let err = EventStore::list(&db, &Caller::System, EventFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied));
    }

    #[tokio::test]
    async fn malformed_ids_look_missing() {
        let db = MemoryStorage::new();
        let ada = user(&db, "ada@example.com").await;
        assert!(EventStore::get(&db, &ada, "nope").await.unwrap().is_none());
        assert!(matches!(
            EventStore::delete(&db, &ada, "nope").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_filters_by_window_and_orders_by_start() {
        let db = MemoryStorage::new();
        let ada = user(&db, "ada@example.com").await;

        for (title, start, end) in [
            ("late", at(15, 18), at(15, 19)),
            ("early", at(15, 8), at(15, 9)),
            ("overnight", at(14, 22), at(15, 0)),
            ("tomorrow", at(16, 0), at(16, 1)),
        ] {
            EventStore::create(&db, &ada, draft(title, start, end))
                .await
                .unwrap();
        }

        let window = DateWindow::resolve(
            NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
            Granularity::Day,
        )
        .unwrap();
        let titles: Vec<_> = EventStore::list(&db, &ada, EventFilter { window: Some(window) })
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();

        assert_eq!(titles, vec!["overnight", "early", "late"]);
    }

    #[tokio::test]
    async fn equal_starts_are_ordered_by_id() {
        let db = MemoryStorage::new();
        let ada = user(&db, "ada@example.com").await;

        for title in ["a", "b", "c"] {
            EventStore::create(&db, &ada, draft(title, at(15, 9), at(15, 10)))
                .await
                .unwrap();
        }

        let ids: Vec<_> = EventStore::list(&db, &ada, EventFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn tokens_resolve_to_their_user_until_revoked() {
        let db = MemoryStorage::new();
        let ada = user(&db, "ada@example.com").await;
        let expires = Utc::now() + chrono::TimeDelta::hours(1);

        TokenStore::create_token(&db, ada.user_id().unwrap(), "hash".into(), expires)
            .await
            .unwrap();

        let (token, owner) = db.resolve_token("hash").await.unwrap().unwrap();
        assert_eq!(owner.to_caller(), ada);
        assert!(!token.is_expired(Utc::now()));

        db.revoke_token("hash").await.unwrap();
        assert!(db.resolve_token("hash").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_patches_both_land() {
        let db = MemoryStorage::new();
        let ada = user(&db, "ada@example.com").await;
        let event = EventStore::create(&db, &ada, draft("Draft", at(15, 9), at(15, 10)))
            .await
            .unwrap();
        let id = event.id.to_string();

        let title = UpdateEventParams {
            title: Some("Retro".into()),
            ..Default::default()
        };
        let description = UpdateEventParams {
            description: Some("Q3 notes".into()),
            ..Default::default()
        };
        let (a, b) = tokio::join!(
            EventStore::patch(&db, &ada, &id, title),
            EventStore::patch(&db, &ada, &id, description),
        );
        a.unwrap();
        b.unwrap();

        let stored = EventStore::get(&db, &ada, &id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Retro");
        assert_eq!(stored.description, "Q3 notes");
    }

    #[tokio::test]
    async fn invalid_patch_leaves_event_untouched() {
        let db = MemoryStorage::new();
        let ada = user(&db, "ada@example.com").await;
        let bob = user(&db, "bob@example.com").await;
        let event = EventStore::create(&db, &ada, draft("Draft", at(15, 9), at(15, 10)))
            .await
            .unwrap();
        let id = event.id.to_string();

        let backwards = UpdateEventParams {
            end_at: Some(at(15, 8)),
            ..Default::default()
        };
        let err = EventStore::patch(&db, &ada, &id, backwards).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(EventStore::get(&db, &ada, &id).await.unwrap(), Some(event));

        let err = EventStore::patch(&db, &bob, &id, UpdateEventParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
