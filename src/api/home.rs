use crate::{
    api::announcements::{ANNOUNCEMENT_COLUMNS, PUBLISHED},
    auth::auth::AuthUser,
    error::AppError,
    model::announcement::Announcement,
};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

const RECENT_ANNOUNCEMENTS: u32 = 5;

#[derive(Serialize, ToSchema)]
pub struct HomeSummary {
    #[schema(example = 17)]
    pub total_documents: i64,
    #[schema(example = 48)]
    pub total_users: i64,
    #[schema(example = 126)]
    pub total_permission_requests: i64,
    pub recent_announcements: Vec<Announcement>,
}

async fn count(pool: &MySqlPool, table: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
}

/// Dashboard totals
#[utoipa::path(
    get,
    path = "/api/v1/home",
    responses(
        (status = 200, description = "Totals and the latest announcements", body = HomeSummary)
    ),
    tag = "Home",
    security(("bearer_auth" = []))
)]
pub async fn home(_auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, AppError> {
    let pool = pool.get_ref();

    let (total_documents, total_users, total_permission_requests) = futures::try_join!(
        count(pool, "document"),
        count(pool, "app_user"),
        count(pool, "permission_request"),
    )?;

    let recent_announcements = sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {} FROM announcement WHERE {} ORDER BY published_at DESC, id DESC LIMIT ?",
        ANNOUNCEMENT_COLUMNS, PUBLISHED
    ))
    .bind(RECENT_ANNOUNCEMENTS)
    .fetch_all(pool)
    .await?;

    Ok(HttpResponse::Ok().json(HomeSummary {
        total_documents,
        total_users,
        total_permission_requests,
        recent_announcements,
    }))
}
