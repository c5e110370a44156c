//! bcrypt hashing, run off the async executor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password worker panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub use bcrypt::DEFAULT_COST;

pub async fn hash(password: String, cost: u32) -> Result<String, PasswordError> {
    Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

/// Check `password` against a stored hash. A malformed hash never verifies.
pub async fn verify(password: String, hash: String) -> Result<bool, PasswordError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
    Ok(verified.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash("correct horse".into(), 4).await.unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(verify("correct horse".into(), hashed.clone()).await.unwrap());
        assert!(!verify("battery staple".into(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_does_not_verify() {
        assert!(!verify("anything".into(), "not-a-hash".into()).await.unwrap());
    }
}
