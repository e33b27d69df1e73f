use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Protocol,
    Circular,
    Manual,
    Report,
    Other,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Protocol => "protocol",
            DocumentKind::Circular => "circular",
            DocumentKind::Manual => "manual",
            DocumentKind::Report => "report",
            DocumentKind::Other => "other",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "protocol" => Ok(DocumentKind::Protocol),
            "circular" => Ok(DocumentKind::Circular),
            "manual" => Ok(DocumentKind::Manual),
            "report" => Ok(DocumentKind::Report),
            "other" => Ok(DocumentKind::Other),
            _ => Err(format!("Invalid document kind: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Document {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "Protocolo de lavado de manos")]
    pub title: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub uploaded_at: DateTime<Utc>,
    #[schema(example = "protocol")]
    pub kind: String,
    #[schema(example = 12)]
    pub author_id: u64,
    #[schema(example = "documents/2024/03/1a2b3c4d5e6f_protocolo.pdf")]
    pub file_path: String,
    #[schema(example = "active")]
    pub status: String,
}
