use almanac_common::{
    caller::Caller,
    params::{CreateEventParams, EventListQuery, EventRangeQuery, UpdateEventParams},
    range::{DateWindow, Granularity, parse_reference_date},
    views::{ApiErrorResponse, Event, EventRange},
};
use almanac_db::storage::{EventFilter, EventStore};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{debug, info};

use crate::{
    auth::Auth,
    context::ApiContext,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
};

#[utoipa::path(
    post,
    path = "/api/events/create/",
    tags = ["events"],
    security(("token" = [])),
    request_body(content = CreateEventParams, content_type = "application/json"),
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid title or time range", body = ApiErrorResponse),
    )
)]
pub async fn create_event(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    ApiJson(body): ApiJson<CreateEventParams>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let draft = body.validate()?;
    let event = EventStore::create(&*ctx.db, &caller, draft).await?;

    info!(event_id = %event.id, "Created event");
    Ok((StatusCode::CREATED, Json(event.into())))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}/",
    tags = ["events"],
    security(("token" = [])),
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Resolved event", body = Event),
        (status = 404, description = "No such event owned by the caller", body = ApiErrorResponse),
    )
)]
pub async fn get_event(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let event = EventStore::get(&*ctx.db, &caller, &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(event.into()))
}

#[utoipa::path(
    put,
    path = "/api/events/{id}/",
    tags = ["events"],
    security(("token" = [])),
    params(("id" = String, Path, description = "Event id")),
    request_body(content = CreateEventParams, content_type = "application/json"),
    responses(
        (status = 200, description = "Replaced event", body = Event),
        (status = 400, description = "Invalid title or time range", body = ApiErrorResponse),
        (status = 404, description = "No such event owned by the caller", body = ApiErrorResponse),
    )
)]
pub async fn replace_event(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CreateEventParams>,
) -> Result<Json<Event>, ApiError> {
    let draft = body.validate()?;
    let event = EventStore::update(&*ctx.db, &caller, &id, draft).await?;
    Ok(Json(event.into()))
}

#[utoipa::path(
    patch,
    path = "/api/events/{id}/",
    tags = ["events"],
    security(("token" = [])),
    params(("id" = String, Path, description = "Event id")),
    request_body(content = UpdateEventParams, content_type = "application/json"),
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Invalid title or time range", body = ApiErrorResponse),
        (status = 404, description = "No such event owned by the caller", body = ApiErrorResponse),
    )
)]
pub async fn update_event(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateEventParams>,
) -> Result<Json<Event>, ApiError> {
    let event = EventStore::patch(&*ctx.db, &caller, &id, body).await?;
    Ok(Json(event.into()))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}/",
    tags = ["events"],
    security(("token" = [])),
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "No such event owned by the caller", body = ApiErrorResponse),
    )
)]
pub async fn delete_event(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    EventStore::delete(&*ctx.db, &caller, &id).await?;
    info!(event_id = %id, "Deleted event");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/events/",
    tags = ["events"],
    security(("token" = [])),
    params(EventListQuery),
    responses(
        (status = 200, description = "Events overlapping the requested window", body = EventRange),
        (status = 400, description = "Missing or invalid granularity or date", body = ApiErrorResponse),
    )
)]
pub async fn list_events(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    ApiQuery(query): ApiQuery<EventListQuery>,
) -> Result<Json<EventRange>, ApiError> {
    let granularity = query
        .granularity
        .as_deref()
        .filter(|g| !g.is_empty())
        .ok_or_else(|| ApiError::validation("granularity: This field is required."))?
        .parse::<Granularity>()?;

    list_window(&ctx, &caller, granularity, query.date.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/events/day/",
    tags = ["events"],
    security(("token" = [])),
    params(EventRangeQuery),
    responses(
        (status = 200, description = "Events overlapping the day containing `date`", body = EventRange),
        (status = 400, description = "Missing or invalid date", body = ApiErrorResponse),
    )
)]
pub async fn list_day(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    ApiQuery(query): ApiQuery<EventRangeQuery>,
) -> Result<Json<EventRange>, ApiError> {
    list_window(&ctx, &caller, Granularity::Day, query.date.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/events/week/",
    tags = ["events"],
    security(("token" = [])),
    params(EventRangeQuery),
    responses(
        (status = 200, description = "Events overlapping the Monday-based week containing `date`", body = EventRange),
        (status = 400, description = "Missing or invalid date", body = ApiErrorResponse),
    )
)]
pub async fn list_week(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    ApiQuery(query): ApiQuery<EventRangeQuery>,
) -> Result<Json<EventRange>, ApiError> {
    list_window(&ctx, &caller, Granularity::Week, query.date.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/events/month/",
    tags = ["events"],
    security(("token" = [])),
    params(EventRangeQuery),
    responses(
        (status = 200, description = "Events overlapping the month containing `date`", body = EventRange),
        (status = 400, description = "Missing or invalid date", body = ApiErrorResponse),
    )
)]
pub async fn list_month(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    ApiQuery(query): ApiQuery<EventRangeQuery>,
) -> Result<Json<EventRange>, ApiError> {
    list_window(&ctx, &caller, Granularity::Month, query.date.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/events/year/",
    tags = ["events"],
    security(("token" = [])),
    params(EventRangeQuery),
    responses(
        (status = 200, description = "Events overlapping the year containing `date`", body = EventRange),
        (status = 400, description = "Missing or invalid date", body = ApiErrorResponse),
    )
)]
pub async fn list_year(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    ApiQuery(query): ApiQuery<EventRangeQuery>,
) -> Result<Json<EventRange>, ApiError> {
    list_window(&ctx, &caller, Granularity::Year, query.date.as_deref()).await
}

async fn list_window(
    ctx: &ApiContext,
    caller: &Caller,
    granularity: Granularity,
    date: Option<&str>,
) -> Result<Json<EventRange>, ApiError> {
    let reference = parse_reference_date(date)?;
    let window = DateWindow::resolve(reference, granularity)?;

    let items: Vec<Event> = EventStore::list(
        &*ctx.db,
        caller,
        EventFilter {
            window: Some(window),
        },
    )
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    debug!(%granularity, %reference, count = items.len(), "Resolved event window");
    Ok(Json(EventRange::build(granularity, reference, &window, items)?))
}
