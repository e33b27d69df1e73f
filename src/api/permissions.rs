use crate::{
    api::{PageQuery, non_blank},
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::permission_request::{
        ADMIN_OVERRIDE_COLUMNS, PERMISSION_COLUMNS, PermissionKind, PermissionRequest,
        PermissionStatus,
    },
    pdf::leave_form::render_leave_request_form,
    utils::{
        activity_log::{self, Activity},
        db_utils::{BindValues, Filters, SqlValue, build_update_sql, execute_update},
        forms::{FieldErrors, FormData, UploadedFile},
        storage::{MediaStore, Purpose},
    },
    workflow::permission::{NewPermissionRequest, PermissionEdit, Transition},
};
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

const TABLE: &str = "permission_request";

/// Multipart body accepted by submit and edit.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct PermissionUpload {
    kind: PermissionKind,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    start_date: String,
    #[schema(example = "2024-03-05", format = "date", value_type = String)]
    end_date: String,
    #[schema(value_type = Option<String>, format = Binary)]
    supporting_document: Option<String>,
}

/// A permission request with its derived display fields.
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 12)]
    pub requester_id: u64,
    pub kind: PermissionKind,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 5)]
    pub requested_days: i64,
    pub status: PermissionStatus,
    #[schema(example = "Pending (no review)")]
    pub status_display: String,
    #[schema(example = "/media/permissions/2024/03/3f2a9c0d11aa_respaldo.pdf", nullable = true)]
    pub supporting_document_url: Option<String>,
    #[schema(example = "2024-02-27T13:05:00Z", format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
    #[schema(nullable = true)]
    pub direction_reviewed_by: Option<String>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub direction_reviewed_at: Option<DateTime<Utc>>,
    #[schema(nullable = true)]
    pub subdirection_reviewed_by: Option<String>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub subdirection_reviewed_at: Option<DateTime<Utc>>,
}

impl PermissionView {
    pub fn new(request: PermissionRequest, media: &MediaStore) -> Self {
        Self {
            requested_days: request.requested_days(),
            status_display: request.describe_status(),
            supporting_document_url: request.supporting_document.as_deref().map(|p| media.url(p)),
            id: request.id,
            requester_id: request.requester_id,
            kind: request.kind,
            start_date: request.start_date,
            end_date: request.end_date,
            status: request.status,
            submitted_at: request.submitted_at,
            direction_reviewed_by: request.direction_reviewed_by,
            direction_reviewed_at: request.direction_reviewed_at,
            subdirection_reviewed_by: request.subdirection_reviewed_by,
            subdirection_reviewed_at: request.subdirection_reviewed_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PermissionListResponse {
    pub data: Vec<PermissionView>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 3)]
    pub total: i64,
}

/// Values used to pre-fill the edit form.
#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct EditPrefill {
    pub kind: PermissionKind,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PermissionFilter {
    /// `all` lists every employee's requests (Direction/Subdirection/Administrator only)
    #[param(example = "mine")]
    pub scope: Option<String>,
    /// Filter by status
    #[param(example = "pending")]
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// A validated submit/edit form.
#[derive(Debug)]
pub struct PermissionForm {
    pub kind: PermissionKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub supporting_document: Option<UploadedFile>,
}

impl PermissionForm {
    pub fn parse(mut form: FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        let kind = form.required_parsed::<PermissionKind>("kind", &mut errors);
        let start_date = form.required_parsed::<NaiveDate>("start_date", &mut errors);
        let end_date = form.required_parsed::<NaiveDate>("end_date", &mut errors);
        let supporting_document = form.take_file("supporting_document");

        match (kind, start_date, end_date) {
            (Some(kind), Some(start_date), Some(end_date)) if errors.is_empty() => Ok(Self {
                kind,
                start_date,
                end_date,
                supporting_document,
            }),
            _ => Err(errors),
        }
    }
}

fn list_location(config: &Config) -> String {
    format!("{}/permissions", config.api_prefix)
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// The caller's own request; anybody else's id is Not-Found.
async fn fetch_own(pool: &MySqlPool, id: u64, requester_id: u64) -> Result<PermissionRequest, AppError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ? AND requester_id = ?",
        PERMISSION_COLUMNS, TABLE
    );

    sqlx::query_as::<_, PermissionRequest>(&sql)
        .bind(id)
        .bind(requester_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Permission request"))
}

/// Rejects an unknown `status` and rewrites a known one to its stored form,
/// so the guarded `status = 'pending'` updates still match the row.
fn canonical_override(mut body: Value) -> Result<Value, AppError> {
    if let Some(status) = body.get_mut("status") {
        let parsed = status
            .as_str()
            .and_then(|s| s.parse::<PermissionStatus>().ok())
            .ok_or_else(|| AppError::BadRequest("Unknown status".into()))?;
        *status = Value::String(parsed.as_str().to_string());
    }
    Ok(body)
}

async fn store_document(
    media: &MediaStore,
    file: Option<&UploadedFile>,
) -> Result<Option<String>, AppError> {
    match file {
        Some(file) => Ok(Some(media.save(Purpose::Permissions, file).await?)),
        None => Ok(None),
    }
}

/// List permission requests
#[utoipa::path(
    get,
    path = "/api/v1/permissions",
    params(PermissionFilter),
    responses(
        (status = 200, description = "Paginated permission requests, newest first", body = PermissionListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "scope=all requested without an office role")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn list_permissions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    media: web::Data<MediaStore>,
    query: web::Query<PermissionFilter>,
) -> Result<HttpResponse, AppError> {
    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve();

    let mut filters = Filters::default();

    if non_blank(&query.scope) == Some("all") {
        auth.require_office()?;
    } else {
        filters.push("requester_id = ?", [SqlValue::I64(auth.user_id as i64)]);
    }

    if let Some(raw) = non_blank(&query.status) {
        let status: PermissionStatus = raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Unknown status `{}`", raw)))?;
        filters.push("status = ?", [SqlValue::String(status.as_str().into())]);
    }

    let where_clause = filters.where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM {}{}", TABLE, where_clause);
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind_all(filters.values())
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {} FROM {}{} ORDER BY submitted_at DESC, id DESC LIMIT ? OFFSET ?",
        PERMISSION_COLUMNS, TABLE, where_clause
    );
    debug!(sql = %data_sql, page, per_page, "Fetching permission requests");

    let rows = sqlx::query_as::<_, PermissionRequest>(&data_sql)
        .bind_all(filters.values())
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(PermissionListResponse {
        data: rows
            .into_iter()
            .map(|r| PermissionView::new(r, &media))
            .collect(),
        page,
        per_page,
        total,
    }))
}

/// Submit a permission request
#[utoipa::path(
    post,
    path = "/api/v1/permissions",
    request_body(content = PermissionUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Request submitted as pending", body = PermissionView),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid form submission")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn submit_permission(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = FormData::from_multipart(payload, config.max_upload_bytes).await?;
    let form = PermissionForm::parse(form).map_err(AppError::Validation)?;

    let supporting_document = store_document(&media, form.supporting_document.as_ref()).await?;

    let new_request = NewPermissionRequest {
        requester_id: auth.user_id,
        kind: form.kind,
        start_date: form.start_date,
        end_date: form.end_date,
        supporting_document,
    };
    let submitted_at = Utc::now();

    let inserted = sqlx::query(
        r#"
        INSERT INTO permission_request
            (requester_id, kind, start_date, end_date, supporting_document, submitted_at, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_request.requester_id)
    .bind(new_request.kind.as_str())
    .bind(new_request.start_date)
    .bind(new_request.end_date)
    .bind(&new_request.supporting_document)
    .bind(submitted_at)
    .bind(PermissionStatus::Pending.as_str())
    .execute(pool.get_ref())
    .await;
    let result = media
        .keep_if_ok(new_request.supporting_document.as_deref(), inserted)
        .await?;

    let created = new_request.into_pending(result.last_insert_id(), submitted_at);

    info!(
        id = created.id,
        requester_id = auth.user_id,
        username = %auth.username,
        days = created.requested_days(),
        "Permission request submitted"
    );
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("submit_permission")
            .on(TABLE, created.id)
            .details(format!("{} {}..{}", created.kind.as_str(), created.start_date, created.end_date)),
    )
    .await;

    Ok(HttpResponse::Created()
        .insert_header((
            header::LOCATION,
            format!("{}/{}", list_location(&config), created.id),
        ))
        .json(PermissionView::new(created, &media)))
}

/// Get one of the caller's permission requests
#[utoipa::path(
    get,
    path = "/api/v1/permissions/{id}",
    params(("id" = u64, Path, description = "Permission request id")),
    responses(
        (status = 200, description = "Permission request", body = PermissionView),
        (status = 404, description = "Not found or not owned by the caller", body = Object, example = json!({
            "message": "Permission request not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn get_permission(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    media: web::Data<MediaStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let request = fetch_own(pool.get_ref(), path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(PermissionView::new(request, &media)))
}

/// Cancel a pending permission request
///
/// Requests that are no longer pending are left untouched; either way the
/// caller is redirected to the list.
#[utoipa::path(
    post,
    path = "/api/v1/permissions/{id}/cancel",
    params(("id" = u64, Path, description = "Permission request id")),
    responses(
        (status = 303, description = "Redirect to the permission list"),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn cancel_permission(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut request = fetch_own(pool.get_ref(), id, auth.user_id).await?;

    if request.cancel() == Transition::Ignored {
        info!(id, status = request.status.as_str(), "Cancel ignored: request is not pending");
        return Ok(see_other(list_location(&config)));
    }

    let result = sqlx::query(
        r#"
        UPDATE permission_request
        SET status = ?
        WHERE id = ? AND requester_id = ? AND status = ?
        "#,
    )
    .bind(PermissionStatus::Cancelled.as_str())
    .bind(id)
    .bind(auth.user_id)
    .bind(PermissionStatus::Pending.as_str())
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        // resolved between the read and the write
        info!(id, "Cancel ignored: request changed concurrently");
    } else {
        activity_log::record(
            pool.get_ref(),
            auth.user_id,
            &req,
            Activity::new("cancel_permission").on(TABLE, id),
        )
        .await;
    }

    Ok(see_other(list_location(&config)))
}

/// Edit-form pre-fill
#[utoipa::path(
    get,
    path = "/api/v1/permissions/{id}/edit",
    params(("id" = u64, Path, description = "Permission request id")),
    responses(
        (status = 200, description = "Current values", body = EditPrefill),
        (status = 404, description = "Not found or not owned by the caller")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn edit_permission_form(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let request = fetch_own(pool.get_ref(), path.into_inner(), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(EditPrefill {
        kind: request.kind,
        start_date: request.start_date,
        end_date: request.end_date,
    }))
}

/// Edit a pending permission request
///
/// Requests that are no longer pending are left untouched and the caller is
/// redirected to the list without validating the form.
#[utoipa::path(
    post,
    path = "/api/v1/permissions/{id}/edit",
    params(("id" = u64, Path, description = "Permission request id")),
    request_body(content = PermissionUpload, content_type = "multipart/form-data"),
    responses(
        (status = 303, description = "Redirect to the permission list"),
        (status = 404, description = "Not found or not owned by the caller"),
        (status = 422, description = "Invalid form submission")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn edit_permission(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut request = fetch_own(pool.get_ref(), id, auth.user_id).await?;

    if !request.is_pending() {
        info!(id, status = request.status.as_str(), "Edit ignored: request is not pending");
        return Ok(see_other(list_location(&config)));
    }

    let form = FormData::from_multipart(payload, config.max_upload_bytes).await?;
    let form = PermissionForm::parse(form).map_err(AppError::Validation)?;
    let uploaded = store_document(&media, form.supporting_document.as_ref()).await?;

    let outcome = request.apply_edit(PermissionEdit {
        kind: form.kind,
        start_date: form.start_date,
        end_date: form.end_date,
        supporting_document: uploaded.clone(),
    });
    if outcome == Transition::Ignored {
        media.discard(uploaded.as_deref()).await;
        return Ok(see_other(list_location(&config)));
    }

    let updated = sqlx::query(
        r#"
        UPDATE permission_request
        SET kind = ?, start_date = ?, end_date = ?, supporting_document = ?
        WHERE id = ? AND requester_id = ? AND status = ?
        "#,
    )
    .bind(request.kind.as_str())
    .bind(request.start_date)
    .bind(request.end_date)
    .bind(&request.supporting_document)
    .bind(id)
    .bind(auth.user_id)
    .bind(PermissionStatus::Pending.as_str())
    .execute(pool.get_ref())
    .await;
    let result = media.keep_if_ok(uploaded.as_deref(), updated).await?;

    if result.rows_affected() == 0 {
        info!(id, "Edit ignored: request changed concurrently");
        media.discard(uploaded.as_deref()).await;
    } else {
        activity_log::record(
            pool.get_ref(),
            auth.user_id,
            &req,
            Activity::new("edit_permission")
                .on(TABLE, id)
                .details(format!("{} {}..{}", request.kind.as_str(), request.start_date, request.end_date)),
        )
        .await;
    }

    Ok(see_other(list_location(&config)))
}

/// Printable leave-request form
#[utoipa::path(
    get,
    path = "/api/v1/permissions/form.pdf",
    responses(
        (status = 200, description = "Blank fixed-layout form", content_type = "application/pdf")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn permission_form_pdf(_auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "inline; filename=\"solicitud_permiso.pdf\"",
        ))
        .body(render_leave_request_form())
}

/// Administrative override of status and reviewer columns
///
/// Sets the stored values directly; no transition guard applies.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/permissions/{id}",
    params(("id" = u64, Path, description = "Permission request id")),
    request_body(content = Object, example = json!({
        "status": "approved",
        "direction_reviewed_by": "Dra. Rojas",
        "direction_reviewed_at": "2024-03-02T10:00:00Z"
    })),
    responses(
        (status = 200, description = "Updated request", body = PermissionView),
        (status = 400, description = "Unknown column or status"),
        (status = 403, description = "Administrator only"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn admin_override_permission(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    media: web::Data<MediaStore>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let id = path.into_inner();

    let body = canonical_override(body.into_inner())?;
    let update = build_update_sql(TABLE, &body, ADMIN_OVERRIDE_COLUMNS, "id", id)?;

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM permission_request WHERE id = ?)")
        .bind(id)
        .fetch_one(pool.get_ref())
        .await?;
    if !exists {
        return Err(AppError::NotFound("Permission request"));
    }

    execute_update(pool.get_ref(), update).await?;

    let sql = format!("SELECT {} FROM {} WHERE id = ?", PERMISSION_COLUMNS, TABLE);
    let request = sqlx::query_as::<_, PermissionRequest>(&sql)
        .bind(id)
        .fetch_one(pool.get_ref())
        .await?;

    info!(
        id,
        admin = %auth.username,
        status = request.status.as_str(),
        "Permission request overridden"
    );
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("override_permission")
            .on(TABLE, id)
            .details(body.to_string()),
    )
    .await;

    Ok(HttpResponse::Ok().json(PermissionView::new(request, &media)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::forms::REQUIRED;
    use chrono::TimeZone;

    #[test]
    fn parses_a_complete_form() {
        let form = FormData::default()
            .with_field("kind", "compensatory")
            .with_field("start_date", "2024-03-01")
            .with_field("end_date", "2024-03-05")
            .with_file("supporting_document", "respaldo.pdf", b"%PDF");

        let parsed = PermissionForm::parse(form).unwrap();
        assert_eq!(parsed.kind, PermissionKind::Compensatory);
        assert_eq!(parsed.end_date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(parsed.supporting_document.unwrap().filename, "respaldo.pdf");
    }

    #[test]
    fn reports_every_bad_field() {
        let form = FormData::default()
            .with_field("kind", "vacaciones")
            .with_field("start_date", "2024-03-01");

        let errors = PermissionForm::parse(form).unwrap_err();
        assert!(errors.get("kind").is_some());
        assert_eq!(errors.get("end_date"), Some(&[REQUIRED.to_string()][..]));
        assert!(errors.get("start_date").is_none());
    }

    #[test]
    fn accepts_reversed_dates() {
        let form = FormData::default()
            .with_field("kind", "administrative")
            .with_field("start_date", "2024-03-05")
            .with_field("end_date", "2024-03-01");
        assert!(PermissionForm::parse(form).is_ok());
    }

    #[test]
    fn view_carries_derived_fields() {
        let request = NewPermissionRequest {
            requester_id: 12,
            kind: PermissionKind::Administrative,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            supporting_document: Some("permissions/2024/02/abc_respaldo.pdf".into()),
        }
        .into_pending(7, Utc.with_ymd_and_hms(2024, 2, 27, 13, 5, 0).unwrap());

        let view = PermissionView::new(request, &MediaStore::new("/srv/media", "/media"));
        assert_eq!(view.requested_days, 5);
        assert_eq!(view.status_display, "Pending (no review)");
        assert_eq!(
            view.supporting_document_url.as_deref(),
            Some("/media/permissions/2024/02/abc_respaldo.pdf")
        );

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["kind"], "administrative");
    }

    #[test]
    fn prefill_serializes_kind_and_dates() {
        let prefill = EditPrefill {
            kind: PermissionKind::Compensatory,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        };
        assert_eq!(
            serde_json::to_value(prefill).unwrap(),
            serde_json::json!({
                "kind": "compensatory",
                "start_date": "2024-03-01",
                "end_date": "2024-03-05"
            })
        );
    }

    #[test]
    fn override_status_is_bound_in_stored_form() {
        let body = canonical_override(serde_json::json!({
            "status": " Pending",
            "direction_reviewed_by": "Dra. Rojas"
        }))
        .unwrap();
        assert_eq!(body["status"], "pending");

        let update = build_update_sql(TABLE, &body, ADMIN_OVERRIDE_COLUMNS, "id", 1).unwrap();
        assert!(update.values.contains(&SqlValue::String("pending".into())));
        assert!(!update.values.contains(&SqlValue::String(" Pending".into())));

        let body = canonical_override(serde_json::json!({ "status": "Approved " })).unwrap();
        assert_eq!(body["status"], "approved");
    }

    #[test]
    fn override_rejects_unknown_or_non_string_status() {
        assert!(canonical_override(serde_json::json!({ "status": "archived" })).is_err());
        assert!(canonical_override(serde_json::json!({ "status": 2 })).is_err());

        let untouched = serde_json::json!({ "subdirection_reviewed_by": "Sr. Muñoz" });
        assert_eq!(canonical_override(untouched.clone()).unwrap(), untouched);
    }
}
