//! Token authentication provider.
//!
//! # Authentication Flow
//!
//! 1. Extract the token from `Authorization: Bearer <token>` (or `Token <token>`)
//! 2. Hash it and look up the stored token together with its user
//! 3. Reject expired tokens
//! 4. Update the token's `last_used_at` timestamp
//! 5. Return authenticated `Caller::User`

use std::sync::Arc;

use almanac_common::caller::Caller;
use almanac_db::storage::{Storage, TokenStore};
use async_trait::async_trait;
use axum::http::request::Parts;
use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::auth::{
    error::AuthError,
    provider::AuthProvider,
    token::{extract_token, hash_token},
};

pub struct BearerTokenAuthProvider {
    db: Arc<dyn Storage>,
}

impl BearerTokenAuthProvider {
    pub fn new(db: Arc<dyn Storage>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthProvider for BearerTokenAuthProvider {
    #[instrument(skip_all, fields(scheme = "bearer"))]
    async fn authenticate(&self, parts: &Parts) -> Result<Caller, AuthError> {
        let token = extract_token(&parts.headers).ok_or(AuthError::MissingCredentials)?;
        let token_hash = hash_token(token);

        let (stored, user) = TokenStore::resolve_token(&*self.db, &token_hash)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if stored.is_expired(Utc::now()) {
            debug!(token_id = %stored.id, "Token expired");
            return Err(AuthError::Expired);
        }

        if let Err(e) = TokenStore::touch_token(&*self.db, &token_hash).await {
            warn!(token_id = %stored.id, error = %e, "Failed to update token last_used_at");
        }

        debug!(user_id = %user.id, "Token authenticated");
        Ok(user.to_caller())
    }

    fn scheme(&self) -> &'static str {
        "bearer"
    }
}

#[cfg(test)]
mod tests {
    use almanac_db::storage::{MemoryStorage, NewLocalUser, UserStore};
    use axum::http::{Request, header};
    use chrono::TimeDelta;

    use super::*;
    use crate::auth::token::generate_token;

    async fn setup() -> (Arc<MemoryStorage>, Caller) {
        let db = Arc::new(MemoryStorage::new());
        let user = UserStore::create_local(
            &*db,
            &Caller::System,
            NewLocalUser {
                email: "ada@example.com".into(),
                display_name: "Ada".into(),
                password_hash: "x".into(),
            },
        )
        .await
        .unwrap();
        (db, user.to_caller())
    }

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder();
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn issue(db: &MemoryStorage, caller: &Caller, ttl: TimeDelta) -> String {
        let token = generate_token();
        TokenStore::create_token(
            db,
            caller.user_id().unwrap(),
            hash_token(&token),
            Utc::now() + ttl,
        )
        .await
        .unwrap();
        token
    }

    #[tokio::test]
    async fn missing_header_is_missing_credentials() {
        let (db, _) = setup().await;
        let provider = BearerTokenAuthProvider::new(db);

        let result = provider.authenticate(&parts(None)).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[tokio::test]
    async fn valid_token_resolves_to_its_user() {
        let (db, caller) = setup().await;
        let token = issue(&db, &caller, TimeDelta::hours(1)).await;
        let provider = BearerTokenAuthProvider::new(db);

        let header = format!("Bearer {token}");
        let result = provider.authenticate(&parts(Some(&header))).await.unwrap();
        assert_eq!(result, caller);
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let (db, _) = setup().await;
        let provider = BearerTokenAuthProvider::new(db);

        let result = provider.authenticate(&parts(Some("Bearer nope"))).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (db, caller) = setup().await;
        let token = issue(&db, &caller, TimeDelta::hours(-1)).await;
        let provider = BearerTokenAuthProvider::new(db);

        let header = format!("Token {token}");
        let result = provider.authenticate(&parts(Some(&header))).await;
        assert!(matches!(result, Err(AuthError::Expired)));
    }
}
