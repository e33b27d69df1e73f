use crate::{
    api::PageQuery,
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::medical_leave::{MedicalLeave, MedicalLeaveKind},
    utils::{
        activity_log::{self, Activity},
        db_utils::{BindValues, Filters, SqlValue},
        forms::{FieldErrors, FormData, UploadedFile},
        storage::{MediaStore, Purpose},
    },
};
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::ToSchema;

const LEAVE_COLUMNS: &str = "id, employee_id, kind, start_date, end_date, rest_days, folio, \
     file_path, uploaded_at, uploaded_by, notes";

#[derive(Serialize, ToSchema)]
pub struct MedicalLeaveListResponse {
    pub data: Vec<MedicalLeave>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 4)]
    pub total: i64,
}

/// Multipart body for registering a leave.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct MedicalLeaveUpload {
    #[schema(example = 12)]
    employee_id: u64,
    kind: MedicalLeaveKind,
    #[schema(example = "2024-04-10", format = "date", value_type = String)]
    start_date: String,
    #[schema(example = "2024-04-16", format = "date", value_type = String)]
    end_date: String,
    #[schema(example = 7)]
    rest_days: i32,
    #[schema(example = "3-48291733")]
    folio: String,
    notes: Option<String>,
    #[schema(value_type = String, format = Binary)]
    file: String,
}

#[derive(Debug)]
struct MedicalLeaveForm {
    employee_id: u64,
    kind: MedicalLeaveKind,
    start_date: NaiveDate,
    end_date: NaiveDate,
    rest_days: i32,
    folio: String,
    notes: Option<String>,
    file: UploadedFile,
}

impl MedicalLeaveForm {
    fn parse(mut form: FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        let employee_id = form.required_parsed::<u64>("employee_id", &mut errors);
        let kind = form.required_parsed::<MedicalLeaveKind>("kind", &mut errors);
        let start_date = form.required_parsed::<NaiveDate>("start_date", &mut errors);
        let end_date = form.required_parsed::<NaiveDate>("end_date", &mut errors);
        let rest_days = form.required_parsed::<i32>("rest_days", &mut errors);
        if rest_days.is_some_and(|d| d < 1) {
            errors.add("rest_days", "Ensure this value is greater than or equal to 1.");
        }
        let folio = form.required("folio", &mut errors).map(str::to_string);
        let notes = form.text("notes").map(str::to_string);
        let file = form.require_file("file", &mut errors);

        match (employee_id, kind, start_date, end_date, rest_days, folio, file) {
            (Some(employee_id), Some(kind), Some(start_date), Some(end_date), Some(rest_days), Some(folio), Some(file))
                if errors.is_empty() =>
            {
                Ok(Self {
                    employee_id,
                    kind,
                    start_date,
                    end_date,
                    rest_days,
                    folio,
                    notes,
                    file,
                })
            }
            _ => Err(errors),
        }
    }
}

/// List medical leaves
///
/// Direction, Subdirection and Administrators see every leave; other staff
/// only their own.
#[utoipa::path(
    get,
    path = "/api/v1/medical-leaves",
    params(PageQuery),
    responses(
        (status = 200, description = "Medical leaves, most recently uploaded first", body = MedicalLeaveListResponse)
    ),
    tag = "MedicalLeave",
    security(("bearer_auth" = []))
)]
pub async fn list_medical_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, per_page, offset) = query.resolve();

    let mut filters = Filters::default();
    if !auth.role.is_office() {
        filters.push("employee_id = ?", [SqlValue::I64(auth.user_id as i64)]);
    }
    let where_clause = filters.where_clause();

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM medical_leave{}", where_clause))
        .bind_all(filters.values())
        .fetch_one(pool.get_ref())
        .await?;

    let leaves = sqlx::query_as::<_, MedicalLeave>(&format!(
        "SELECT {} FROM medical_leave{} ORDER BY uploaded_at DESC, id DESC LIMIT ? OFFSET ?",
        LEAVE_COLUMNS, where_clause
    ))
    .bind_all(filters.values())
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(MedicalLeaveListResponse {
        data: leaves,
        page,
        per_page,
        total,
    }))
}

fn duplicate_folio(folio: &str) -> AppError {
    AppError::Conflict(format!("Folio {} is already registered", folio))
}

/// Register a medical leave
#[utoipa::path(
    post,
    path = "/api/v1/medical-leaves",
    request_body(content = MedicalLeaveUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Leave registered", body = MedicalLeave),
        (status = 403, description = "Direction/Subdirection only"),
        (status = 409, description = "Folio already registered", body = Object, example = json!({
            "message": "Folio 3-48291733 is already registered"
        })),
        (status = 422, description = "Invalid form submission")
    ),
    tag = "MedicalLeave",
    security(("bearer_auth" = []))
)]
pub async fn register_medical_leave(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    auth.require_office()?;

    let form = FormData::from_multipart(payload, config.max_upload_bytes).await?;
    let form = MedicalLeaveForm::parse(form).map_err(AppError::Validation)?;

    let employee_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM app_user WHERE id = ?)")
            .bind(form.employee_id)
            .fetch_one(pool.get_ref())
            .await?;
    if !employee_exists {
        let mut errors = FieldErrors::default();
        errors.add("employee_id", "Unknown employee.");
        return Err(AppError::Validation(errors));
    }

    let folio_taken =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM medical_leave WHERE folio = ?)")
            .bind(&form.folio)
            .fetch_one(pool.get_ref())
            .await?;
    if folio_taken {
        return Err(duplicate_folio(&form.folio));
    }

    let file_path = media.save(Purpose::MedicalLeaves, &form.file).await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO medical_leave
            (employee_id, kind, start_date, end_date, rest_days, folio, file_path, uploaded_at, uploaded_by, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, UTC_TIMESTAMP(), ?, ?)
        "#,
    )
    .bind(form.employee_id)
    .bind(form.kind.as_str())
    .bind(form.start_date)
    .bind(form.end_date)
    .bind(form.rest_days)
    .bind(&form.folio)
    .bind(&file_path)
    .bind(auth.user_id)
    .bind(&form.notes)
    .execute(pool.get_ref())
    .await;
    let result = media
        .keep_if_ok(Some(file_path.as_str()), inserted)
        .await
        .map_err(|e| {
            if AppError::is_duplicate_key(&e) {
                // registered by a concurrent request after the folio check
                warn!(folio = %form.folio, "Duplicate medical leave folio");
                duplicate_folio(&form.folio)
            } else {
                AppError::Database(e)
            }
        })?;

    let id = result.last_insert_id();
    let leave = sqlx::query_as::<_, MedicalLeave>(&format!(
        "SELECT {} FROM medical_leave WHERE id = ?",
        LEAVE_COLUMNS
    ))
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;

    info!(id, employee_id = form.employee_id, uploaded_by = auth.user_id, "Medical leave registered");
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("register_medical_leave")
            .on("medical_leave", id)
            .details(form.folio),
    )
    .await;

    Ok(HttpResponse::Created().json(leave))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> FormData {
        FormData::default()
            .with_field("employee_id", "12")
            .with_field("kind", "work_accident")
            .with_field("start_date", "2024-04-10")
            .with_field("end_date", "2024-04-16")
            .with_field("rest_days", "7")
            .with_field("folio", " 3-48291733 ")
            .with_file("file", "licencia.pdf", b"%PDF")
    }

    #[test]
    fn parses_a_complete_registration() {
        let parsed = MedicalLeaveForm::parse(complete()).unwrap();
        assert_eq!(parsed.kind, MedicalLeaveKind::WorkAccident);
        assert_eq!(parsed.rest_days, 7);
        assert_eq!(parsed.folio, "3-48291733");
        assert!(parsed.notes.is_none());
    }

    #[test]
    fn rest_days_must_be_positive() {
        let errors = MedicalLeaveForm::parse(complete().with_field("rest_days", "0")).unwrap_err();
        assert!(errors.get("rest_days").is_some());
    }

    #[test]
    fn missing_scan_is_reported() {
        let mut form = complete();
        form.take_file("file");
        let errors = MedicalLeaveForm::parse(form).unwrap_err();
        assert!(errors.get("file").is_some());
    }

    #[test]
    fn duplicate_folio_is_a_conflict() {
        use actix_web::{ResponseError, http::StatusCode};

        let err = duplicate_folio("3-48291733");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Folio 3-48291733 is already registered");
    }
}
