use crate::{
    api::PageQuery,
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::announcement::{Announcement, AnnouncementKind},
    utils::{
        activity_log::{self, Activity},
        forms::{FieldErrors, FormData, UploadedFile},
        storage::{MediaStore, Purpose},
    },
};
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

pub(crate) const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, body, published_at, scheduled_for, author_id, featured, attachment, kind";

/// Announcements whose scheduled time, if any, has already passed.
pub(crate) const PUBLISHED: &str = "(scheduled_for IS NULL OR scheduled_for <= UTC_TIMESTAMP())";

#[derive(Serialize, ToSchema)]
pub struct AnnouncementListResponse {
    pub data: Vec<Announcement>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 9)]
    pub total: i64,
}

/// Multipart body for publishing.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct AnnouncementUpload {
    #[schema(example = "Campaña de vacunación")]
    title: String,
    body: String,
    /// Defaults to `normal`
    kind: Option<AnnouncementKind>,
    /// Checkbox; `on`/`true`/`1`
    featured: Option<String>,
    /// RFC 3339 or `YYYY-MM-DDTHH:MM` (UTC)
    #[schema(example = "2024-05-02T08:00")]
    scheduled_for: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    attachment: Option<String>,
}

#[derive(Debug)]
struct AnnouncementForm {
    title: String,
    body: String,
    kind: AnnouncementKind,
    featured: bool,
    scheduled_for: Option<DateTime<Utc>>,
    attachment: Option<UploadedFile>,
}

/// RFC 3339, or the `datetime-local` shape browsers send, taken as UTC.
fn parse_schedule(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl AnnouncementForm {
    fn parse(mut form: FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = form.required("title", &mut errors).map(str::to_string);
        let body = form.required("body", &mut errors).map(str::to_string);
        let kind = form
            .optional_parsed::<AnnouncementKind>("kind", &mut errors)
            .unwrap_or_default();
        let featured = form.flag("featured");

        let scheduled_for = match form.text("scheduled_for") {
            Some(raw) => {
                let parsed = parse_schedule(raw);
                if parsed.is_none() {
                    errors.add("scheduled_for", "Enter a valid date/time.");
                }
                parsed
            }
            None => None,
        };
        let attachment = form.take_file("attachment");

        match (title, body) {
            (Some(title), Some(body)) if errors.is_empty() => Ok(Self {
                title,
                body,
                kind,
                featured,
                scheduled_for,
                attachment,
            }),
            _ => Err(errors),
        }
    }
}

/// List published announcements
#[utoipa::path(
    get,
    path = "/api/v1/announcements",
    params(PageQuery),
    responses(
        (status = 200, description = "Published announcements, newest first", body = AnnouncementListResponse)
    ),
    tag = "Announcement",
    security(("bearer_auth" = []))
)]
pub async fn list_announcements(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, per_page, offset) = query.resolve();

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM announcement WHERE {}",
        PUBLISHED
    ))
    .fetch_one(pool.get_ref())
    .await?;

    let data_sql = format!(
        "SELECT {} FROM announcement WHERE {} ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
        ANNOUNCEMENT_COLUMNS, PUBLISHED
    );
    let announcements = sqlx::query_as::<_, Announcement>(&data_sql)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(AnnouncementListResponse {
        data: announcements,
        page,
        per_page,
        total,
    }))
}

/// Publish an announcement
#[utoipa::path(
    post,
    path = "/api/v1/announcements",
    request_body(content = AnnouncementUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Announcement published", body = Announcement),
        (status = 422, description = "Invalid form submission")
    ),
    tag = "Announcement",
    security(("bearer_auth" = []))
)]
pub async fn publish_announcement(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = FormData::from_multipart(payload, config.max_upload_bytes).await?;
    let form = AnnouncementForm::parse(form).map_err(AppError::Validation)?;

    let attachment = match &form.attachment {
        Some(file) => Some(media.save(Purpose::Announcements, file).await?),
        None => None,
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO announcement
            (title, body, published_at, scheduled_for, author_id, featured, attachment, kind)
        VALUES (?, ?, UTC_TIMESTAMP(), ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&form.title)
    .bind(&form.body)
    .bind(form.scheduled_for)
    .bind(auth.user_id)
    .bind(form.featured)
    .bind(&attachment)
    .bind(form.kind.as_str())
    .execute(pool.get_ref())
    .await;
    let result = media.keep_if_ok(attachment.as_deref(), inserted).await?;

    let id = result.last_insert_id();
    let announcement = sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {} FROM announcement WHERE id = ?",
        ANNOUNCEMENT_COLUMNS
    ))
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;

    info!(id, author_id = auth.user_id, featured = form.featured, "Announcement published");
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("publish_announcement")
            .on("announcement", id)
            .details(form.title),
    )
    .await;

    Ok(HttpResponse::Created().json(announcement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kind_defaults_to_normal_and_featured_follows_checkbox() {
        let form = FormData::default()
            .with_field("title", "Corte de agua")
            .with_field("body", "Mañana entre 9 y 11.")
            .with_field("featured", "on");

        let parsed = AnnouncementForm::parse(form).unwrap();
        assert_eq!(parsed.kind, AnnouncementKind::Normal);
        assert!(parsed.featured);
        assert!(parsed.scheduled_for.is_none());
        assert!(parsed.attachment.is_none());
    }

    #[test]
    fn schedule_accepts_rfc3339_and_datetime_local() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        assert_eq!(parse_schedule("2024-05-02T08:00:00Z"), Some(expected));
        assert_eq!(parse_schedule("2024-05-02T04:00:00-04:00"), Some(expected));
        assert_eq!(parse_schedule("2024-05-02T08:00"), Some(expected));
        assert_eq!(parse_schedule("mañana"), None);
    }

    #[test]
    fn bad_schedule_and_kind_are_field_errors() {
        let form = FormData::default()
            .with_field("title", "x")
            .with_field("body", "y")
            .with_field("kind", "gossip")
            .with_field("scheduled_for", "soon");

        let errors = AnnouncementForm::parse(form).unwrap_err();
        assert!(errors.get("kind").is_some());
        assert!(errors.get("scheduled_for").is_some());
    }
}
