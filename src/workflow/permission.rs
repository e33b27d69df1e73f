//! Lifecycle rules for permission requests.
//!
//! ```text
//!            cancel (owner)
//!   Pending ───────────────▶ Cancelled
//!      │
//!      └── administrative data edit ──▶ Approved | Rejected
//! ```
//!
//! Only `cancel` and `edit` are owner operations; both are guarded on
//! `Pending` and are silent no-ops otherwise. Approved and Rejected are set
//! by administrators directly on the stored row.

use crate::model::permission_request::{PermissionKind, PermissionRequest, PermissionStatus};
use chrono::{DateTime, NaiveDate, Utc};

/// Whether a guarded operation changed the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct NewPermissionRequest {
    pub requester_id: u64,
    pub kind: PermissionKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub supporting_document: Option<String>,
}

impl NewPermissionRequest {
    /// The record as it exists right after submission. Date order and overlap
    /// with other requests are deliberately not checked.
    pub fn into_pending(self, id: u64, submitted_at: DateTime<Utc>) -> PermissionRequest {
        PermissionRequest {
            id,
            requester_id: self.requester_id,
            kind: self.kind,
            start_date: self.start_date,
            end_date: self.end_date,
            supporting_document: self.supporting_document,
            submitted_at,
            status: PermissionStatus::Pending,
            direction_reviewed_by: None,
            direction_reviewed_at: None,
            subdirection_reviewed_by: None,
            subdirection_reviewed_at: None,
        }
    }
}

/// Owner-editable fields. A `None` document keeps the one already attached.
#[derive(Debug, Clone)]
pub struct PermissionEdit {
    pub kind: PermissionKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub supporting_document: Option<String>,
}

fn recorded(reviewer: &Option<String>) -> Option<&str> {
    reviewer.as_deref().map(str::trim).filter(|r| !r.is_empty())
}

impl PermissionRequest {
    /// Inclusive calendar-day count; no business-day or holiday adjustment.
    pub fn requested_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn is_pending(&self) -> bool {
        self.status == PermissionStatus::Pending
    }

    /// Human-readable combined status of the request and its two reviews.
    pub fn describe_status(&self) -> String {
        let direction = recorded(&self.direction_reviewed_by);
        let subdirection = recorded(&self.subdirection_reviewed_by);

        match self.status {
            PermissionStatus::Approved => match (direction, subdirection) {
                (Some(d), Some(s)) => format!("Approved by {} and {}", d, s),
                (Some(one), None) | (None, Some(one)) => format!("Approved by {}", one),
                (None, None) => "Approved".to_string(),
            },
            PermissionStatus::Rejected => "Request Rejected".to_string(),
            PermissionStatus::Cancelled => "Cancelled by the employee".to_string(),
            PermissionStatus::Pending => match (direction, subdirection) {
                (Some(_), None) => "Pending: missing Subdirection review".to_string(),
                (None, Some(_)) => "Pending: missing Direction review".to_string(),
                (None, None) => "Pending (no review)".to_string(),
                (Some(_), Some(_)) => "Pending: awaiting final resolution".to_string(),
            },
        }
    }

    pub fn cancel(&mut self) -> Transition {
        if !self.is_pending() {
            return Transition::Ignored;
        }
        self.status = PermissionStatus::Cancelled;
        Transition::Applied
    }

    /// Overwrites kind, dates and (when given) the document. The requester
    /// never changes.
    pub fn apply_edit(&mut self, edit: PermissionEdit) -> Transition {
        if !self.is_pending() {
            return Transition::Ignored;
        }
        self.kind = edit.kind;
        self.start_date = edit.start_date;
        self.end_date = edit.end_date;
        if let Some(document) = edit.supporting_document {
            self.supporting_document = Some(document);
        }
        Transition::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn submitted(start: NaiveDate, end: NaiveDate) -> PermissionRequest {
        NewPermissionRequest {
            requester_id: 12,
            kind: PermissionKind::Administrative,
            start_date: start,
            end_date: end,
            supporting_document: None,
        }
        .into_pending(1, Utc.with_ymd_and_hms(2024, 2, 27, 13, 5, 0).unwrap())
    }

    fn with_reviews(
        status: PermissionStatus,
        direction: Option<&str>,
        subdirection: Option<&str>,
    ) -> PermissionRequest {
        let mut request = submitted(date(2024, 3, 1), date(2024, 3, 5));
        request.status = status;
        request.direction_reviewed_by = direction.map(str::to_string);
        request.subdirection_reviewed_by = subdirection.map(str::to_string);
        request
    }

    fn edit_to(kind: PermissionKind, start: NaiveDate, end: NaiveDate) -> PermissionEdit {
        PermissionEdit {
            kind,
            start_date: start,
            end_date: end,
            supporting_document: None,
        }
    }

    #[test]
    fn submission_scenario() {
        let request = submitted(date(2024, 3, 1), date(2024, 3, 5));

        assert_eq!(request.requested_days(), 5);
        assert_eq!(request.status, PermissionStatus::Pending);
        assert_eq!(request.describe_status(), "Pending (no review)");
    }

    #[test]
    fn requested_days_is_inclusive() {
        let single = submitted(date(2024, 3, 1), date(2024, 3, 1));
        assert_eq!(single.requested_days(), 1);

        // crosses a leap day
        let across = submitted(date(2024, 2, 27), date(2024, 3, 2));
        assert_eq!(across.requested_days(), 5);

        let year = submitted(date(2023, 1, 1), date(2023, 12, 31));
        assert_eq!(year.requested_days(), 365);
    }

    #[test]
    fn requested_days_matches_date_difference() {
        let start = date(2024, 1, 10);
        for offset in 0..60 {
            let end = start + chrono::Duration::days(offset);
            assert_eq!(submitted(start, end).requested_days(), offset + 1);
        }
    }

    #[test]
    fn submission_does_not_validate_date_order() {
        let reversed = submitted(date(2024, 3, 5), date(2024, 3, 1));
        assert_eq!(reversed.status, PermissionStatus::Pending);
        assert_eq!(reversed.requested_days(), -3);
    }

    #[test]
    fn cancel_applies_once() {
        let mut request = submitted(date(2024, 3, 1), date(2024, 3, 5));

        assert_eq!(request.cancel(), Transition::Applied);
        assert_eq!(request.status, PermissionStatus::Cancelled);

        assert_eq!(request.cancel(), Transition::Ignored);
        assert_eq!(request.status, PermissionStatus::Cancelled);
    }

    #[test]
    fn edit_after_cancel_is_ignored() {
        let mut request = submitted(date(2024, 3, 1), date(2024, 3, 5));
        request.cancel();
        let before = request.clone();

        let outcome = request.apply_edit(edit_to(
            PermissionKind::Compensatory,
            date(2024, 4, 1),
            date(2024, 4, 2),
        ));

        assert_eq!(outcome, Transition::Ignored);
        assert_eq!(request, before);
    }

    #[test]
    fn resolved_requests_are_never_mutated() {
        for status in [
            PermissionStatus::Approved,
            PermissionStatus::Rejected,
            PermissionStatus::Cancelled,
        ] {
            let mut request = with_reviews(status, Some("Dra. Rojas"), None);
            let before = request.clone();

            assert_eq!(request.cancel(), Transition::Ignored);
            assert_eq!(
                request.apply_edit(PermissionEdit {
                    kind: PermissionKind::Compensatory,
                    start_date: date(2025, 1, 1),
                    end_date: date(2025, 1, 3),
                    supporting_document: Some("permissions/x.pdf".into()),
                }),
                Transition::Ignored
            );
            assert_eq!(request, before, "{status:?} was mutated");
        }
    }

    #[test]
    fn edit_overwrites_fields_but_not_requester() {
        let mut request = submitted(date(2024, 3, 1), date(2024, 3, 5));
        request.supporting_document = Some("permissions/2024/02/old.pdf".into());

        let outcome = request.apply_edit(edit_to(
            PermissionKind::Compensatory,
            date(2024, 3, 11),
            date(2024, 3, 12),
        ));

        assert_eq!(outcome, Transition::Applied);
        assert_eq!(request.kind, PermissionKind::Compensatory);
        assert_eq!(request.requested_days(), 2);
        assert_eq!(request.requester_id, 12);
        assert_eq!(
            request.supporting_document.as_deref(),
            Some("permissions/2024/02/old.pdf")
        );

        request.apply_edit(PermissionEdit {
            supporting_document: Some("permissions/2024/03/new.pdf".into()),
            ..edit_to(PermissionKind::Compensatory, date(2024, 3, 11), date(2024, 3, 12))
        });
        assert_eq!(
            request.supporting_document.as_deref(),
            Some("permissions/2024/03/new.pdf")
        );
    }

    #[test]
    fn pending_description_tracks_missing_review() {
        let cases = [
            (None, None, "Pending (no review)"),
            (Some("Dra. Rojas"), None, "Pending: missing Subdirection review"),
            (None, Some("Sr. Muñoz"), "Pending: missing Direction review"),
            (Some("Dra. Rojas"), Some("Sr. Muñoz"), "Pending: awaiting final resolution"),
        ];
        for (direction, subdirection, expected) in cases {
            let request = with_reviews(PermissionStatus::Pending, direction, subdirection);
            assert_eq!(request.describe_status(), expected);
        }
    }

    #[test]
    fn approved_description_names_reviewers() {
        let both = with_reviews(PermissionStatus::Approved, Some("Dra. Rojas"), Some("Sr. Muñoz"));
        assert_eq!(both.describe_status(), "Approved by Dra. Rojas and Sr. Muñoz");

        let second_only = with_reviews(PermissionStatus::Approved, None, Some("Sr. Muñoz"));
        assert_eq!(second_only.describe_status(), "Approved by Sr. Muñoz");

        let none = with_reviews(PermissionStatus::Approved, None, None);
        assert_eq!(none.describe_status(), "Approved");
    }

    #[test]
    fn blank_reviewer_counts_as_not_recorded() {
        let request = with_reviews(PermissionStatus::Approved, Some("  "), None);
        assert_eq!(request.describe_status(), "Approved");
    }

    #[test]
    fn terminal_descriptions_are_fixed() {
        let rejected = with_reviews(PermissionStatus::Rejected, Some("Dra. Rojas"), None);
        assert_eq!(rejected.describe_status(), "Request Rejected");

        let cancelled = with_reviews(PermissionStatus::Cancelled, None, None);
        assert_eq!(cancelled.describe_status(), "Cancelled by the employee");
    }
}
