use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MedicalLeaveKind {
    Maternal,
    Illness,
    WorkAccident,
    CommuteAccident,
    Extension,
}

impl MedicalLeaveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MedicalLeaveKind::Maternal => "maternal",
            MedicalLeaveKind::Illness => "illness",
            MedicalLeaveKind::WorkAccident => "work_accident",
            MedicalLeaveKind::CommuteAccident => "commute_accident",
            MedicalLeaveKind::Extension => "extension",
        }
    }
}

impl FromStr for MedicalLeaveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "maternal" => Ok(MedicalLeaveKind::Maternal),
            "illness" => Ok(MedicalLeaveKind::Illness),
            "work_accident" => Ok(MedicalLeaveKind::WorkAccident),
            "commute_accident" => Ok(MedicalLeaveKind::CommuteAccident),
            "extension" => Ok(MedicalLeaveKind::Extension),
            _ => Err(format!("Invalid medical leave kind: {}", s)),
        }
    }
}

/// A licencia médica registered for an employee, with the scanned form.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct MedicalLeave {
    #[schema(example = 4)]
    pub id: u64,
    #[schema(example = 12)]
    pub employee_id: u64,
    #[schema(example = "illness")]
    pub kind: String,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = 7)]
    pub rest_days: i32,
    #[schema(example = "3-48291733")]
    pub folio: String,
    pub file_path: String,
    #[schema(value_type = String, format = "date-time")]
    pub uploaded_at: DateTime<Utc>,
    #[schema(example = 2)]
    pub uploaded_by: u64,
    #[schema(nullable = true)]
    pub notes: Option<String>,
}
