use crate::{
    api::non_blank,
    auth::{
        auth::AuthUser,
        provision::{NewUser, provision_user},
    },
    config::Config,
    error::AppError,
    model::{
        role::Role,
        user::{UPDATABLE_USER_COLUMNS, USER_COLUMNS, User},
    },
    utils::{
        activity_log::{self, Activity},
        db_utils::{BindValues, Filters, SqlValue, build_update_sql, execute_update},
        username_index::UsernameIndex,
    },
};
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

const USER_STATUSES: &[&str] = &["active", "inactive"];

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQuery {
    /// Matches username, first/last name or email
    pub search: Option<String>,
    pub role_id: Option<u8>,
    #[param(example = "active")]
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    #[schema(example = json!([{
        "id": 12,
        "username": "mgonzalez",
        "first_name": "María",
        "last_name": "González",
        "email": "mgonzalez@cesfam.cl",
        "rut": "12.345.678-5",
        "phone": null,
        "position": "Enfermera",
        "role_id": 4,
        "status": "active",
        "is_superuser": false,
        "last_login_at": null,
        "date_joined": "2024-01-08T12:00:00Z"
    }]))]
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 48)]
    pub total: i64,
}

/// Extra checks on a PATCH body beyond the column whitelist.
fn validate_patch(body: &Value) -> Result<(), AppError> {
    if let Some(role_id) = body.get("role_id") {
        let known = role_id
            .as_u64()
            .and_then(|id| u8::try_from(id).ok())
            .and_then(Role::from_id)
            .is_some();
        if !known {
            return Err(AppError::BadRequest("Unknown role".into()));
        }
    }
    if let Some(status) = body.get("status") {
        if !status.as_str().is_some_and(|s| USER_STATUSES.contains(&s)) {
            return Err(AppError::BadRequest("Status must be `active` or `inactive`".into()));
        }
    }
    Ok(())
}

async fn fetch_user(pool: &MySqlPool, user_id: u64) -> Result<User, AppError> {
    let sql = format!("SELECT {} FROM app_user WHERE id = ?", USER_COLUMNS);
    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User"))
}

/// Staff directory
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut filters = Filters::default();

    if let Some(role_id) = query.role_id {
        filters.push("role_id = ?", [SqlValue::I64(role_id.into())]);
    }
    if let Some(status) = non_blank(&query.status) {
        filters.push("status = ?", [SqlValue::String(status.into())]);
    }
    if let Some(search) = non_blank(&query.search) {
        let like = format!("%{}%", search);
        filters.push(
            "(username LIKE ? OR first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)",
            std::iter::repeat(SqlValue::String(like)).take(4),
        );
    }

    let where_clause = filters.where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM app_user{}", where_clause);
    debug!(sql = %count_sql, values = ?filters.values(), "Counting users");
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind_all(filters.values())
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {} FROM app_user{} ORDER BY last_name, first_name, id LIMIT ? OFFSET ?",
        USER_COLUMNS, where_clause
    );
    let users = sqlx::query_as::<_, User>(&data_sql)
        .bind_all(filters.values())
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users,
        page,
        per_page,
        total,
    }))
}

/// Get user by id
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found", body = Object, example = json!({
            "message": "User not found"
        }))
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let user = fetch_user(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Provision a new account
///
/// When `is_superuser` is set the account is also given the Administrator
/// role.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 403, description = "Administrator only"),
        (status = 409, description = "Username or RUT already exists", body = Object, example = json!({
            "message": "Username already taken"
        })),
        (status = 422, description = "Invalid fields")
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    index: web::Data<UsernameIndex>,
    config: web::Data<Config>,
    payload: web::Json<NewUser>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let user_id = provision_user(pool.get_ref(), &index, &payload).await?;
    let user = fetch_user(pool.get_ref(), user_id).await?;

    info!(user_id, username = %user.username, role_id = user.role_id, "User provisioned");
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("create_user")
            .on("app_user", user_id)
            .details(user.username.clone()),
    )
    .await;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("{}/users/{}", config.api_prefix, user_id)))
        .json(user))
}

/// Update user
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body(content = Object, example = json!({
        "position": "Jefa de SOME",
        "status": "inactive"
    })),
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Field cannot be updated"),
        (status = 403, description = "Administrator only"),
        (status = 404, description = "User not found")
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    validate_patch(&body)?;
    let update = build_update_sql("app_user", &body, UPDATABLE_USER_COLUMNS, "id", user_id)?;

    // existence first: MySQL reports 0 affected rows for a no-op update
    fetch_user(pool.get_ref(), user_id).await?;

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        if AppError::is_duplicate_key(&e) {
            AppError::Conflict("RUT already exists".into())
        } else {
            AppError::Database(e)
        }
    })?;

    let user = fetch_user(pool.get_ref(), user_id).await?;
    activity_log::record(
        pool.get_ref(),
        auth.user_id,
        &req,
        Activity::new("update_user")
            .on("app_user", user_id)
            .details(body.to_string()),
    )
    .await;

    Ok(HttpResponse::Ok().json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_accepts_known_roles_and_statuses() {
        assert!(validate_patch(&json!({ "role_id": 2, "status": "inactive" })).is_ok());
        assert!(validate_patch(&json!({ "position": "TENS" })).is_ok());
    }

    #[test]
    fn patch_rejects_unknown_roles_and_statuses() {
        assert!(validate_patch(&json!({ "role_id": 9 })).is_err());
        assert!(validate_patch(&json!({ "role_id": "2" })).is_err());
        assert!(validate_patch(&json!({ "status": "banned" })).is_err());
    }
}
