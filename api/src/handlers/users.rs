use almanac_common::{
    caller::Caller,
    params::{AuthLoginParams, CreateLocalUserParams, UpdateUserParams},
    views::{ApiErrorResponse, AuthTokenResponse, User},
};
use almanac_db::{
    models::DbUserChanges,
    password,
    storage::{NewLocalUser, TokenStore, UserStore},
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use tracing::{debug, info};

use crate::{
    auth::{
        Auth,
        token::{extract_token, generate_token, hash_token},
    },
    context::ApiContext,
    error::ApiError,
    extract::ApiJson,
};

#[utoipa::path(
    post,
    path = "/api/user/create/",
    tags = ["user"],
    request_body(content = CreateLocalUserParams, content_type = "application/json"),
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid fields or email already taken", body = ApiErrorResponse),
    )
)]
pub async fn create_user(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<CreateLocalUserParams>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let body = body.validate()?;
    let password_hash = password::hash(body.password, ctx.config.password_hash_cost).await?;

    let user = UserStore::create_local(
        &*ctx.db,
        &Caller::System,
        NewLocalUser {
            email: body.email,
            display_name: body.display_name,
            password_hash,
        },
    )
    .await?;

    info!(user_id = %user.id, "Registered user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/api/user/token/",
    tags = ["user"],
    request_body(content = AuthLoginParams, content_type = "application/json"),
    responses(
        (status = 200, description = "Token issued", body = AuthTokenResponse),
        (status = 400, description = "Unknown email or wrong password", body = ApiErrorResponse),
    )
)]
pub async fn obtain_token(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<AuthLoginParams>,
) -> Result<Json<AuthTokenResponse>, ApiError> {
    let email = body.email.trim().to_lowercase();
    let Some(user) = UserStore::get_by_email(&*ctx.db, &Caller::System, &email).await? else {
        let decoy = ctx.login_decoy_hash().await?.to_string();
        password::verify(body.password, decoy).await?;
        debug!("Login for unknown email");
        return Err(ApiError::InvalidLogin);
    };

    if !password::verify(body.password, user.password_hash.clone()).await? {
        debug!(user_id = %user.id, "Password mismatch");
        return Err(ApiError::InvalidLogin);
    }

    let token = generate_token();
    let expires_at = Utc::now() + ctx.config.token_ttl();
    let stored =
        TokenStore::create_token(&*ctx.db, *user.id.inner(), hash_token(&token), expires_at)
            .await?;

    info!(user_id = %user.id, token_id = %stored.id, "Issued token");
    Ok(Json(AuthTokenResponse {
        token,
        expires_at: stored.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/api/user/logout/",
    tags = ["user"],
    security(("token" = [])),
    responses((status = 204, description = "Token revoked"))
)]
pub async fn logout(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = extract_token(&headers) {
        TokenStore::revoke_token(&*ctx.db, &hash_token(token)).await?;
        debug!(user_id = ?caller.user_id(), "Revoked token");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/user/me/",
    tags = ["user"],
    security(("token" = [])),
    responses((status = 200, description = "The authenticated user", body = User))
)]
pub async fn get_me(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
) -> Result<Json<User>, ApiError> {
    let id = caller.require_user()?;
    let user = UserStore::get(&*ctx.db, &caller, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/api/user/me/",
    tags = ["user"],
    security(("token" = [])),
    request_body(content = UpdateUserParams, content_type = "application/json"),
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid fields or email already taken", body = ApiErrorResponse),
    )
)]
pub async fn update_me(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    ApiJson(body): ApiJson<UpdateUserParams>,
) -> Result<Json<User>, ApiError> {
    let id = caller.require_user()?;
    let body = body.validate()?;
    if body.is_empty() {
        return get_me(State(ctx), Auth(caller)).await;
    }

    let password_hash = match body.password {
        Some(password) => Some(password::hash(password, ctx.config.password_hash_cost).await?),
        None => None,
    };

    let user = UserStore::update(
        &*ctx.db,
        &caller,
        id,
        DbUserChanges {
            email: body.email,
            display_name: body.display_name,
            password_hash,
            updated_at: Utc::now(),
        },
    )
    .await?;

    Ok(Json(user.into()))
}
