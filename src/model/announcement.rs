use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    Urgent,
    Important,
    #[default]
    Normal,
    Info,
}

impl AnnouncementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementKind::Urgent => "urgent",
            AnnouncementKind::Important => "important",
            AnnouncementKind::Normal => "normal",
            AnnouncementKind::Info => "info",
        }
    }
}

impl FromStr for AnnouncementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "urgent" => Ok(AnnouncementKind::Urgent),
            "important" => Ok(AnnouncementKind::Important),
            "normal" => Ok(AnnouncementKind::Normal),
            "info" => Ok(AnnouncementKind::Info),
            _ => Err(format!("Invalid announcement kind: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Announcement {
    #[schema(example = 8)]
    pub id: u64,
    #[schema(example = "Campaña de vacunación")]
    pub title: String,
    #[schema(example = "Desde el lunes se inicia la campaña de invierno.")]
    pub body: String,
    #[schema(value_type = String, format = "date-time")]
    pub published_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[schema(example = 1)]
    pub author_id: u64,
    pub featured: bool,
    #[schema(nullable = true)]
    pub attachment: Option<String>,
    #[schema(example = "normal")]
    pub kind: String,
}
