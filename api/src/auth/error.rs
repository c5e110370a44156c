use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credentials expired")]
    Expired,

    #[error(transparent)]
    Storage(#[from] almanac_db::storage::StoreError),
}
