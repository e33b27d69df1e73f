use crate::{
    auth::auth::AuthUser,
    error::AppError,
    utils::storage::{MediaStore, content_type_for},
};
use actix_web::{HttpResponse, web};
use std::io::ErrorKind;

/// Download a stored upload
#[utoipa::path(
    get,
    path = "/media/{path}",
    params(("path" = String, Path, description = "Path relative to the media root")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such file")
    ),
    tag = "Media",
    security(("bearer_auth" = []))
)]
pub async fn serve_media(
    _auth: AuthUser,
    media: web::Data<MediaStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let full = media
        .resolve(&path)
        .ok_or(AppError::NotFound("File"))?;

    let bytes = match tokio::fs::read(&full).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(AppError::NotFound("File")),
        Err(e) => return Err(AppError::Storage(e)),
    };

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&full))
        .body(bytes))
}
