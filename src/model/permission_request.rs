use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    /// Día administrativo
    Administrative,
    /// Compensatory time off for overtime already worked
    Compensatory,
}

impl PermissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Administrative => "administrative",
            PermissionKind::Compensatory => "compensatory",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Pending => "pending",
            PermissionStatus::Approved => "approved",
            PermissionStatus::Rejected => "rejected",
            PermissionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value `{}`", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for PermissionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "administrative" => Ok(PermissionKind::Administrative),
            "compensatory" => Ok(PermissionKind::Compensatory),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl FromStr for PermissionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PermissionStatus::Pending),
            "approved" => Ok(PermissionStatus::Approved),
            "rejected" => Ok(PermissionStatus::Rejected),
            "cancelled" => Ok(PermissionStatus::Cancelled),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// An employee's petition for administrative or compensatory leave, reviewed
/// by two offices.
///
/// The first approval line is the Direction, the second the Subdirection.
/// The two sign-offs are independent: either may be recorded first.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PermissionRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 12)]
    pub requester_id: u64,
    pub kind: PermissionKind,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "permissions/2024/03/3f2a9c0d11aa_respaldo.pdf", nullable = true)]
    pub supporting_document: Option<String>,
    #[schema(example = "2024-02-27T13:05:00Z", format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
    pub status: PermissionStatus,
    #[schema(example = "Dra. Rojas", nullable = true)]
    pub direction_reviewed_by: Option<String>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub direction_reviewed_at: Option<DateTime<Utc>>,
    #[schema(nullable = true)]
    pub subdirection_reviewed_by: Option<String>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub subdirection_reviewed_at: Option<DateTime<Utc>>,
}

pub const PERMISSION_COLUMNS: &str = "id, requester_id, kind, start_date, end_date, \
     supporting_document, submitted_at, status, direction_reviewed_by, direction_reviewed_at, \
     subdirection_reviewed_by, subdirection_reviewed_at";

/// Columns an administrator may set directly, outside the owner workflow.
pub const ADMIN_OVERRIDE_COLUMNS: &[&str] = &[
    "status",
    "direction_reviewed_by",
    "direction_reviewed_at",
    "subdirection_reviewed_by",
    "subdirection_reviewed_at",
];

fn decode_enum<T: FromStr<Err = UnknownVariant>>(row: &MySqlRow, column: &str) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: UnknownVariant| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, MySqlRow> for PermissionRequest {
    fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            requester_id: row.try_get("requester_id")?,
            kind: decode_enum(row, "kind")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            supporting_document: row.try_get("supporting_document")?,
            submitted_at: row.try_get("submitted_at")?,
            status: decode_enum(row, "status")?,
            direction_reviewed_by: row.try_get("direction_reviewed_by")?,
            direction_reviewed_at: row.try_get("direction_reviewed_at")?,
            subdirection_reviewed_by: row.try_get("subdirection_reviewed_by")?,
            subdirection_reviewed_at: row.try_get("subdirection_reviewed_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_statuses_parse_their_stored_form() {
        for kind in [PermissionKind::Administrative, PermissionKind::Compensatory] {
            assert_eq!(kind.as_str().parse::<PermissionKind>(), Ok(kind));
        }
        for status in [
            PermissionStatus::Pending,
            PermissionStatus::Approved,
            PermissionStatus::Rejected,
            PermissionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<PermissionStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            "vacaciones".parse::<PermissionKind>(),
            Err(UnknownVariant("vacaciones".into()))
        );
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_value(PermissionStatus::Cancelled).unwrap();
        assert_eq!(json, "cancelled");
    }
}
