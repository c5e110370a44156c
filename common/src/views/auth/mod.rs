use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthTokenResponse {
    /// The access token for the authenticated user. Send it in the
    /// `Authorization: Bearer <token>` header of subsequent requests. It is
    /// only ever returned once.
    pub token: String,

    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}
