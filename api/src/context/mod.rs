use std::sync::Arc;

use almanac_db::{password, storage::Storage};
use tokio::sync::OnceCell;

use crate::{
    auth::{AuthManager, BearerTokenAuthProvider},
    config::AlmanacApiConfig,
};

const LOGIN_DECOY_PASSWORD: &str = "almanac-login-decoy";

#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<AlmanacApiConfig>,
    pub db: Arc<dyn Storage>,
    pub auth_manager: Arc<AuthManager>,

    /// Hash checked when a login names an unknown email, so that path
    /// costs the same bcrypt work as a wrong password.
    pub login_decoy: Arc<OnceCell<String>>,
}

impl ApiContext {
    pub fn new(config: AlmanacApiConfig, db: Arc<dyn Storage>) -> Self {
        let auth_manager =
            AuthManager::new().with_provider(BearerTokenAuthProvider::new(Arc::clone(&db)));

        Self {
            config: Arc::new(config),
            db,
            auth_manager: Arc::new(auth_manager),
            login_decoy: Arc::new(OnceCell::new()),
        }
    }

    pub async fn login_decoy_hash(&self) -> Result<&str, password::PasswordError> {
        let cost = self.config.password_hash_cost;
        let hash = self
            .login_decoy
            .get_or_try_init(|| password::hash(LOGIN_DECOY_PASSWORD.into(), cost))
            .await?;
        Ok(hash.as_str())
    }
}
