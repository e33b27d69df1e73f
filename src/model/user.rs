use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A staff member as listed in the directory; never carries the password hash.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = "mgonzalez")]
    pub username: String,
    #[schema(example = "María")]
    pub first_name: String,
    #[schema(example = "González")]
    pub last_name: String,
    #[schema(example = "mgonzalez@cesfam.cl")]
    pub email: String,
    #[schema(example = "12.345.678-5", nullable = true)]
    pub rut: Option<String>,
    #[schema(example = "+56912345678", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Enfermera", nullable = true)]
    pub position: Option<String>,
    #[schema(example = 4)]
    pub role_id: u8,
    #[schema(example = "active")]
    pub status: String,
    pub is_superuser: bool,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub last_login_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub date_joined: DateTime<Utc>,
}

pub const USER_COLUMNS: &str = "id, username, first_name, last_name, email, rut, phone, position, \
     role_id, status, is_superuser, last_login_at, date_joined";

/// Columns an administrator may change through `PATCH /users/{id}`.
pub const UPDATABLE_USER_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "rut",
    "phone",
    "position",
    "role_id",
    "status",
];
