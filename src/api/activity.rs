use crate::{
    api::{PageQuery, non_blank},
    auth::auth::AuthUser,
    error::AppError,
    model::activity_log::ActivityLogEntry,
    utils::db_utils::{BindValues, Filters, SqlValue},
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityQuery {
    /// Affected table, e.g. `permission_request`
    pub table: Option<String>,
    /// Acting user
    pub user_id: Option<u64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct ActivityListResponse {
    pub data: Vec<ActivityLogEntry>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 311)]
    pub total: i64,
}

/// Audit trail
#[utoipa::path(
    get,
    path = "/api/v1/activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Activity, newest first", body = ActivityListResponse),
        (status = 403, description = "Administrator only")
    ),
    tag = "Activity",
    security(("bearer_auth" = []))
)]
pub async fn list_activity(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ActivityQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let (page, per_page, offset) = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve();

    let mut filters = Filters::default();
    if let Some(table) = non_blank(&query.table) {
        filters.push("table_name = ?", [SqlValue::String(table.into())]);
    }
    if let Some(user_id) = query.user_id {
        filters.push("user_id = ?", [SqlValue::I64(user_id as i64)]);
    }
    let where_clause = filters.where_clause();

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM activity_log{}", where_clause))
        .bind_all(filters.values())
        .fetch_one(pool.get_ref())
        .await?;

    let entries = sqlx::query_as::<_, ActivityLogEntry>(&format!(
        "SELECT id, user_id, action, occurred_at, table_name, object_id, ip_address, details \
         FROM activity_log{} ORDER BY occurred_at DESC, id DESC LIMIT ? OFFSET ?",
        where_clause
    ))
    .bind_all(filters.values())
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(ActivityListResponse {
        data: entries,
        page,
        per_page,
        total,
    }))
}
