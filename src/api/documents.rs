use crate::{
    api::{PageQuery, non_blank},
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::document::{Document, DocumentKind},
    utils::{
        activity_log::{self, Activity},
        db_utils::{BindValues, Filters, SqlValue},
        forms::{FieldErrors, FormData, UploadedFile},
        storage::{MediaStore, Purpose},
    },
};
use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

const DOCUMENT_COLUMNS: &str = "id, title, description, uploaded_at, kind, author_id, file_path, status";

#[derive(Debug, Deserialize, IntoParams)]
pub struct DocumentQuery {
    #[param(example = "protocol")]
    pub kind: Option<String>,
    /// `active` or `archived`
    #[param(example = "active")]
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub data: Vec<Document>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 17)]
    pub total: i64,
}

/// Multipart body for an upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct DocumentUpload {
    #[schema(example = "Protocolo de lavado de manos")]
    title: String,
    description: Option<String>,
    kind: DocumentKind,
    #[schema(value_type = String, format = Binary)]
    file: String,
}

#[derive(Debug)]
struct DocumentForm {
    title: String,
    description: Option<String>,
    kind: DocumentKind,
    file: UploadedFile,
}

impl DocumentForm {
    fn parse(mut form: FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = form.required("title", &mut errors).map(str::to_string);
        if title.as_ref().is_some_and(|t| t.chars().count() > 200) {
            errors.add("title", "Ensure this value has at most 200 characters.");
        }
        let description = form.text("description").map(str::to_string);
        let kind = form.required_parsed::<DocumentKind>("kind", &mut errors);
        let file = form.require_file("file", &mut errors);

        match (title, kind, file) {
            (Some(title), Some(kind), Some(file)) if errors.is_empty() => Ok(Self {
                title,
                description,
                kind,
                file,
            }),
            _ => Err(errors),
        }
    }
}

/// List documents
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    params(DocumentQuery),
    responses(
        (status = 200, description = "Documents, newest first", body = DocumentListResponse)
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn list_documents(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DocumentQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve();

    let mut filters = Filters::default();
    if let Some(kind) = non_blank(&query.kind) {
        filters.push("kind = ?", [SqlValue::String(kind.to_lowercase())]);
    }
    if let Some(status) = non_blank(&query.status) {
        filters.push("status = ?", [SqlValue::String(status.to_lowercase())]);
    }
    let where_clause = filters.where_clause();

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM document{}", where_clause))
        .bind_all(filters.values())
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {} FROM document{} ORDER BY uploaded_at DESC, id DESC LIMIT ? OFFSET ?",
        DOCUMENT_COLUMNS, where_clause
    );
    let documents = sqlx::query_as::<_, Document>(&data_sql)
        .bind_all(filters.values())
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(DocumentListResponse {
        data: documents,
        page,
        per_page,
        total,
    }))
}

/// Upload a document
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body(content = DocumentUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = Document),
        (status = 422, description = "Invalid form submission")
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn upload_document(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = FormData::from_multipart(payload, config.max_upload_bytes).await?;
    let form = DocumentForm::parse(form).map_err(AppError::Validation)?;

    let file_path = media.save(Purpose::Documents, &form.file).await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO document (title, description, uploaded_at, kind, author_id, file_path, status)
        VALUES (?, ?, UTC_TIMESTAMP(), ?, ?, ?, 'active')
        "#,
    )
    .bind(&form.title)
    .bind(&form.description)
    .bind(form.kind.as_str())
    .bind(auth.user_id)
    .bind(&file_path)
    .execute(pool.get_ref())
    .await;
    let result = media.keep_if_ok(Some(file_path.as_str()), inserted).await?;

    let id = result.last_insert_id();
    let document = sqlx::query_as::<_, Document>(&format!(
        "SELECT {} FROM document WHERE id = ?",
        DOCUMENT_COLUMNS
    ))
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;

    info!(id, author_id = auth.user_id, kind = form.kind.as_str(), "Document uploaded");
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("upload_document").on("document", id).details(form.title),
    )
    .await;

    Ok(HttpResponse::Created().json(document))
}

/// Archive a document
#[utoipa::path(
    post,
    path = "/api/v1/documents/{document_id}/archive",
    params(("document_id" = u64, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document archived", body = Document),
        (status = 403, description = "Only the author or an administrator"),
        (status = 404, description = "Document not found")
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn archive_document(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let select = format!("SELECT {} FROM document WHERE id = ?", DOCUMENT_COLUMNS);

    let document = sqlx::query_as::<_, Document>(&select)
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or(AppError::NotFound("Document"))?;

    auth.require_owner_or_admin(document.author_id)?;

    sqlx::query("UPDATE document SET status = 'archived' WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("archive_document").on("document", id),
    )
    .await;

    let document = sqlx::query_as::<_, Document>(&select)
        .bind(id)
        .fetch_one(pool.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::forms::REQUIRED;

    #[test]
    fn upload_form_requires_title_kind_and_file() {
        let errors = DocumentForm::parse(FormData::default().with_field("kind", "memo")).unwrap_err();

        assert_eq!(errors.get("title"), Some(&[REQUIRED.to_string()][..]));
        assert_eq!(errors.get("file"), Some(&[REQUIRED.to_string()][..]));
        assert!(errors.get("kind").is_some());
    }

    #[test]
    fn upload_form_keeps_optional_description() {
        let form = FormData::default()
            .with_field("title", "Manual de inducción")
            .with_field("kind", "Manual")
            .with_file("file", "induccion.pdf", b"%PDF");

        let parsed = DocumentForm::parse(form).unwrap();
        assert_eq!(parsed.kind, DocumentKind::Manual);
        assert!(parsed.description.is_none());
        assert_eq!(parsed.file.filename, "induccion.pdf");
    }

    #[test]
    fn overlong_titles_are_rejected() {
        let form = FormData::default()
            .with_field("title", &"x".repeat(201))
            .with_field("kind", "other")
            .with_file("file", "a.pdf", b"%PDF");
        assert!(DocumentForm::parse(form).unwrap_err().get("title").is_some());
    }
}
