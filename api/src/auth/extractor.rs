use std::future::Future;
use std::sync::Arc;

use almanac_common::caller::{Caller, CallerError};
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{auth::AuthError, context::ApiContext, error::ApiError};

/// Extractor that REQUIRES authentication.
///
/// Returns 401 Unauthorized if no provider accepts the request's
/// credentials. Storage failures while resolving a token surface as 500.
///
/// # Examples
///
/// ```rust,ignore
/// use almanac_api::auth::Auth;
///
/// pub async fn get_event(
///     State(ctx): State<ApiContext>,
///     Auth(caller): Auth,  // ← extracts authenticated caller
///     Path(id): Path<String>,
/// ) -> Result<Json<Event>, ApiError> {
///     let event = EventStore::get(&*ctx.db, &caller, &id)
///         .await?
///         .ok_or(ApiError::NotFound)?;
///     Ok(Json(event.into()))
/// }
/// ```
pub struct Auth(pub Caller);

impl FromRequestParts<ApiContext> for Auth {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &ApiContext,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let auth_manager = Arc::clone(&state.auth_manager);
        async move {
            let caller = auth_manager
                .authenticate(parts)
                .await
                .map_err(|e| match e {
                    AuthError::Storage(se) => ApiError::Storage(se),
                    other => ApiError::CallerError(CallerError::unauthorized(Some(
                        other.to_string(),
                    ))),
                })?;
            Ok(Auth(caller))
        }
    }
}
