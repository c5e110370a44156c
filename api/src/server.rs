use std::sync::Arc;

use almanac_common::views::ApiErrorResponse;
use almanac_db::storage::Storage;
use anyhow::Context;
use axum::{
    Router,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request, header},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use utoipa::{
    Modify, OpenApi as _, ToSchema,
    openapi::{
        Contact, Info, License, OpenApi, RefOr,
        path::Operation,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

use crate::{config::AlmanacApiConfig, context::ApiContext, handlers};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Name of the security scheme referenced by authenticated operations.
pub const TOKEN_SECURITY_SCHEME: &str = "token";

#[derive(utoipa::OpenApi)]
#[openapi(modifiers(&TokenSecurity), components(schemas(ApiErrorResponse)))]
struct ApiComponents;

struct TokenSecurity;

impl Modify for TokenSecurity {
    fn modify(&self, openapi: &mut OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            TOKEN_SECURITY_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some(
                        "Token from `POST /api/user/token/`, sent as `Authorization: Bearer <token>`.",
                    ))
                    .build(),
            ),
        );
    }
}

/// Build the application router and its OpenAPI document.
pub fn make(cfg: AlmanacApiConfig, db: Arc<dyn Storage>) -> anyhow::Result<(Router, OpenApi)> {
    let allow_origin = cfg
        .public_url
        .trim_end_matches('/')
        .parse::<HeaderValue>()
        .context("public URL is not a valid origin header")?;

    let context = ApiContext::new(cfg, db);

    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            MakeRequestUuid,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                let span = info_span!(
                    "http_request",
                    method = req.method().to_string(),
                    request_id = Option::<&str>::None,
                    path = Option::<&str>::None,
                );

                if let Some(request_id) = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                {
                    span.record("request_id", request_id);
                }

                if let Some(path) = req.extensions().get::<MatchedPath>() {
                    span.record("path", path.as_str())
                } else {
                    span.record("path", req.uri().path())
                };

                span
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_credentials(true)
                .allow_origin(allow_origin)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id));

    let mut openapi = OpenApi::builder()
        .info(
            Info::builder()
                .title("Almanac API Reference")
                .version(env!("CARGO_PKG_VERSION"))
                .description(Some(
                    "Personal calendar events with day, week, month and year views.",
                ))
                .license(Some(
                    License::builder()
                        .name("Apache 2.0 License")
                        .identifier(Some(env!("CARGO_PKG_LICENSE")))
                        .build(),
                ))
                .contact(Some(Contact::builder().name(Some("Almanac maintainers")).build())),
        )
        .build();
    openapi.merge(ApiComponents::openapi());

    let (router, mut api) = OpenApiRouter::with_openapi(openapi)
        .routes(routes!(handlers::health_check))
        .routes(routes!(handlers::users::create_user))
        .routes(routes!(handlers::users::obtain_token))
        .routes(routes!(handlers::users::logout))
        .routes(routes!(handlers::users::get_me, handlers::users::update_me))
        .routes(routes!(handlers::events::create_event))
        .routes(routes!(handlers::events::list_events))
        .routes(routes!(handlers::events::list_day))
        .routes(routes!(handlers::events::list_week))
        .routes(routes!(handlers::events::list_month))
        .routes(routes!(handlers::events::list_year))
        .routes(routes!(
            handlers::events::get_event,
            handlers::events::replace_event,
            handlers::events::update_event,
            handlers::events::delete_event
        ))
        .layer(middleware)
        .with_state(context)
        .split_for_parts();

    api.paths.paths.iter_mut().for_each(|(_path, item)| {
        apply_default_errors(&mut item.get);
        apply_default_errors(&mut item.post);
        apply_default_errors(&mut item.patch);
        apply_default_errors(&mut item.put);
        apply_default_errors(&mut item.delete);
        apply_default_errors(&mut item.trace);
        apply_default_errors(&mut item.head);
        apply_default_errors(&mut item.options);
    });

    let router = router.merge(Redoc::with_url("/redoc/", api.clone()));

    Ok((router, api))
}

fn error_ref(summary: &str) -> RefOr<utoipa::openapi::Response> {
    RefOr::Ref(
        utoipa::openapi::Ref::builder()
            .summary(summary)
            .ref_location_from_schema_name(ApiErrorResponse::name())
            .build(),
    )
}

/// Document the error responses every operation can produce. Only
/// operations that require a token can fail with 401/403.
fn apply_default_errors(item: &mut Option<Operation>) {
    if let Some(item) = item {
        let secured = item.security.as_ref().is_some_and(|s| !s.is_empty());

        if secured {
            item.responses
                .responses
                .entry("401".into())
                .or_insert_with(|| error_ref("Unauthorized"));
            item.responses
                .responses
                .entry("403".into())
                .or_insert_with(|| error_ref("Forbidden"));
        }

        item.responses
            .responses
            .entry("500".into())
            .or_insert_with(|| error_ref("Internal server error"));
    }
}
