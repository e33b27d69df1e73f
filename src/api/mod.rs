pub mod activity;
pub mod announcements;
pub mod calendar;
pub mod documents;
pub mod home;
pub mod media;
pub mod medical_leaves;
pub mod permissions;
pub mod users;

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Page number, starting at 1
    #[schema(example = 1)]
    pub page: Option<u32>,
    /// Items per page (max 100)
    #[schema(example = 20)]
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// (page, per_page, offset)
    pub fn resolve(&self) -> (u32, u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page, (page - 1) * per_page)
    }
}

/// Trimmed filter value; absent or blank -> None.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_clamps_and_offsets() {
        let q = PageQuery {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(q.resolve(), (3, 10, 20));

        let q = PageQuery {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(q.resolve(), (1, 100, 0));

        assert_eq!(PageQuery::default().resolve(), (1, 20, 0));
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&Some(" pending ".into())), Some("pending"));
        assert_eq!(non_blank(&None), None);
    }
}
