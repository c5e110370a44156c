//! Opaque API tokens.
//!
//! Clients receive the raw token once, at login. Only its SHA-256 digest is
//! persisted, so a leaked database row cannot be replayed as a credential.

use axum::http::{HeaderMap, header};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

pub const TOKEN_LEN: usize = 40;

/// Schemes accepted in the `Authorization` header, matched case-insensitively.
const SCHEMES: [&str; 2] = ["Bearer", "Token"];

pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Pull the raw token out of `Authorization: Bearer <token>` (or `Token <token>`).
///
/// Returns `None` when the header is absent, not ASCII, uses another scheme,
/// or carries an empty token.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn generated_tokens_are_alphanumeric_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_stable_hex_sha256() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn extracts_bearer_and_token_schemes() {
        assert_eq!(extract_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_token(&headers("Token abc123")), Some("abc123"));
        assert_eq!(extract_token(&headers("bearer abc123")), Some("abc123"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(extract_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_token(&headers("Bearer ")), None);
        assert_eq!(extract_token(&headers("Bearer")), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
