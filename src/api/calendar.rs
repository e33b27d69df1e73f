use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::calendar_event::{CalendarEvent, EVENT_COLUMNS, EventKind, UPDATABLE_EVENT_COLUMNS},
    utils::{
        activity_log::{self, Activity},
        db_utils::{BindValues, Filters, SqlValue, build_update_sql, execute_update},
        forms::{FieldErrors, REQUIRED},
    },
};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct EventRange {
    /// Events ending on or after this day
    #[param(example = "2024-05-01", value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Events starting on or before this day
    #[param(example = "2024-05-31", value_type = Option<String>)]
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct EventListResponse {
    pub data: Vec<CalendarEvent>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEvent {
    #[schema(example = "Capacitación IAAS")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "2024-05-02T09:00:00Z", format = "date-time", value_type = String)]
    pub starts_at: DateTime<Utc>,
    #[schema(example = "2024-05-02T11:00:00Z", format = "date-time", value_type = String)]
    pub ends_at: DateTime<Utc>,
    #[schema(example = "training")]
    pub kind: String,
    #[schema(example = "Sala de reuniones")]
    pub location: Option<String>,
}

fn check_span(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>, errors: &mut FieldErrors) {
    if ends_at < starts_at {
        errors.add("ends_at", "The end must not be before the start.");
    }
}

impl CreateEvent {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();

        if self.title.trim().is_empty() {
            errors.add("title", REQUIRED);
        }
        if !EventKind::is_valid(&self.kind) {
            errors.add("kind", format!("Select a valid choice. `{}` is not one of the available choices.", self.kind));
        }
        check_span(self.starts_at, self.ends_at, &mut errors);

        errors
    }
}

fn timestamp_field(body: &Value, field: &str, errors: &mut FieldErrors) -> Option<DateTime<Utc>> {
    let raw = body.get(field)?;
    let parsed = raw
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    if parsed.is_none() {
        errors.add(field, "Enter a valid RFC 3339 date/time.");
    }
    parsed
}

/// Checks a PATCH body against the event it would modify.
fn validate_patch(current: &CalendarEvent, body: &Value) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if let Some(kind) = body.get("kind") {
        if !kind.as_str().is_some_and(EventKind::is_valid) {
            errors.add("kind", "Select a valid choice.");
        }
    }
    if let Some(title) = body.get("title") {
        if !title.as_str().is_some_and(|t| !t.trim().is_empty()) {
            errors.add("title", REQUIRED);
        }
    }

    let starts_at = timestamp_field(body, "starts_at", &mut errors).unwrap_or(current.starts_at);
    let ends_at = timestamp_field(body, "ends_at", &mut errors).unwrap_or(current.ends_at);
    check_span(starts_at, ends_at, &mut errors);

    errors
}

async fn fetch_event(pool: &MySqlPool, id: u64) -> Result<CalendarEvent, AppError> {
    sqlx::query_as::<_, CalendarEvent>(&format!(
        "SELECT {} FROM calendar_event WHERE id = ?",
        EVENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Event"))
}

/// List calendar events
#[utoipa::path(
    get,
    path = "/api/v1/calendar",
    params(EventRange),
    responses(
        (status = 200, description = "Events ordered by start", body = EventListResponse)
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EventRange>,
) -> Result<HttpResponse, AppError> {
    let mut filters = Filters::default();

    if let Some(from) = query.from {
        filters.push("ends_at >= ?", [SqlValue::Date(from)]);
    }
    if let Some(to) = query.to.and_then(|d| d.succ_opt()) {
        filters.push("starts_at < ?", [SqlValue::Date(to)]);
    }

    let sql = format!(
        "SELECT {} FROM calendar_event{} ORDER BY starts_at, id",
        EVENT_COLUMNS,
        filters.where_clause()
    );
    debug!(sql = %sql, values = ?filters.values(), "Fetching events");

    let events = sqlx::query_as::<_, CalendarEvent>(&sql)
        .bind_all(filters.values())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EventListResponse { data: events }))
}

/// Create a calendar event
#[utoipa::path(
    post,
    path = "/api/v1/calendar",
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = CalendarEvent),
        (status = 422, description = "Invalid fields", body = Object, example = json!({
            "message": "Invalid form submission",
            "errors": { "ends_at": ["The end must not be before the start."] }
        }))
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn create_event(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEvent>,
) -> Result<HttpResponse, AppError> {
    payload.validate().into_result()?;

    let result = sqlx::query(
        r#"
        INSERT INTO calendar_event (title, description, starts_at, ends_at, kind, location, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.starts_at)
    .bind(payload.ends_at)
    .bind(&payload.kind)
    .bind(&payload.location)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    let event = fetch_event(pool.get_ref(), id).await?;

    info!(id, created_by = auth.user_id, "Calendar event created");
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("create_event").on("calendar_event", id),
    )
    .await;

    Ok(HttpResponse::Created().json(event))
}

/// Update a calendar event
#[utoipa::path(
    patch,
    path = "/api/v1/calendar/{event_id}",
    params(("event_id" = u64, Path, description = "Event ID")),
    request_body(content = Object, example = json!({
        "location": "Auditorio",
        "ends_at": "2024-05-02T12:00:00Z"
    })),
    responses(
        (status = 200, description = "Updated event", body = CalendarEvent),
        (status = 400, description = "Field cannot be updated"),
        (status = 403, description = "Only the creator or an administrator"),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Invalid fields")
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn update_event(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let current = fetch_event(pool.get_ref(), id).await?;
    auth.require_owner_or_admin(current.created_by)?;

    let update = build_update_sql("calendar_event", &body, UPDATABLE_EVENT_COLUMNS, "id", id)?;
    validate_patch(&current, &body).into_result()?;

    execute_update(pool.get_ref(), update).await?;

    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("update_event")
            .on("calendar_event", id)
            .details(body.to_string()),
    )
    .await;

    let event = fetch_event(pool.get_ref(), id).await?;
    Ok(HttpResponse::Ok().json(event))
}

/// Delete a calendar event
#[utoipa::path(
    delete,
    path = "/api/v1/calendar/{event_id}",
    params(("event_id" = u64, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Only the creator or an administrator"),
        (status = 404, description = "Event not found", body = Object, example = json!({
            "message": "Event not found"
        }))
    ),
    tag = "Calendar",
    security(("bearer_auth" = []))
)]
pub async fn delete_event(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let current = fetch_event(pool.get_ref(), id).await?;
    auth.require_owner_or_admin(current.created_by)?;

    sqlx::query("DELETE FROM calendar_event WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    info!(id, deleted_by = auth.user_id, title = %current.title, "Calendar event deleted");
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("delete_event")
            .on("calendar_event", id)
            .details(current.title),
    )
    .await;

    Ok(HttpResponse::NoContent().finish())
}
