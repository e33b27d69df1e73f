use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Meeting,
    Training,
    Holiday,
    Activity,
    Other,
}

impl EventKind {
    const ALL: [EventKind; 5] = [
        EventKind::Meeting,
        EventKind::Training,
        EventKind::Holiday,
        EventKind::Activity,
        EventKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Meeting => "meeting",
            EventKind::Training => "training",
            EventKind::Holiday => "holiday",
            EventKind::Activity => "activity",
            EventKind::Other => "other",
        }
    }

    pub fn is_valid(value: &str) -> bool {
        Self::ALL.iter().any(|kind| kind.as_str() == value)
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct CalendarEvent {
    #[schema(example = 21)]
    pub id: u64,
    #[schema(example = "Capacitación IAAS")]
    pub title: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub starts_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub ends_at: DateTime<Utc>,
    #[schema(example = "training")]
    pub kind: String,
    #[schema(example = "Sala de reuniones", nullable = true)]
    pub location: Option<String>,
    #[schema(example = 12)]
    pub created_by: u64,
}

pub const EVENT_COLUMNS: &str =
    "id, title, description, starts_at, ends_at, kind, location, created_by";

pub const UPDATABLE_EVENT_COLUMNS: &[&str] = &[
    "title",
    "description",
    "starts_at",
    "ends_at",
    "kind",
    "location",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_kinds_are_valid() {
        assert!(EventKind::is_valid("training"));
        assert!(EventKind::is_valid(EventKind::Holiday.as_str()));
        assert!(!EventKind::is_valid("Training"));
        assert!(!EventKind::is_valid("fiesta"));
    }
}
