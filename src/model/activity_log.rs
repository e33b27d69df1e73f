use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ActivityLogEntry {
    pub id: u64,
    #[schema(example = 12)]
    pub user_id: u64,
    #[schema(example = "cancel_permission")]
    pub action: String,
    #[schema(value_type = String, format = "date-time")]
    pub occurred_at: DateTime<Utc>,
    #[schema(example = "permission_request", nullable = true)]
    pub table_name: Option<String>,
    #[schema(example = 42, nullable = true)]
    pub object_id: Option<u64>,
    #[schema(example = "10.0.0.7", nullable = true)]
    pub ip_address: Option<String>,
    #[schema(nullable = true)]
    pub details: Option<String>,
}
