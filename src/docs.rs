use crate::api::activity::ActivityListResponse;
use crate::api::announcements::{AnnouncementListResponse, AnnouncementUpload};
use crate::api::calendar::{CreateEvent, EventListResponse};
use crate::api::documents::{DocumentListResponse, DocumentUpload};
use crate::api::home::HomeSummary;
use crate::api::medical_leaves::{MedicalLeaveListResponse, MedicalLeaveUpload};
use crate::api::permissions::{EditPrefill, PermissionListResponse, PermissionUpload, PermissionView};
use crate::api::users::UserListResponse;
use crate::auth::handlers::LoginResponse;
use crate::auth::provision::NewUser;
use crate::model::{
    activity_log::ActivityLogEntry,
    announcement::{Announcement, AnnouncementKind},
    calendar_event::{CalendarEvent, EventKind},
    document::{Document, DocumentKind},
    medical_leave::{MedicalLeave, MedicalLeaveKind},
    permission_request::{PermissionKind, PermissionStatus},
    role::Role,
    user::User,
};
use crate::models::LoginReqDto;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CESFAM Intranet API",
        version = "1.0.0",
        description = r#"
## CESFAM staff intranet

Backend for the internal portal of a family health center (CESFAM).

### Key Features
- **Permission requests**
  - Employees submit administrative or compensatory leave requests, edit or cancel them while pending,
    and print the blank request form as PDF
  - Administrators record the Direction and Subdirection reviews and the final resolution
- **Medical leaves**
  - Direction and Subdirection register scanned licencias with their folio
- **Documents, announcements and calendar**
  - Shared protocols and circulars, scheduled announcements with attachments, center events
- **Staff directory and activity log**

### Security
All endpoints except login/refresh/logout need a **JWT Bearer** access token.

### Redirects
Cancel and edit answer `303 See Other` pointing at the permission list, also when the
request was no longer pending and nothing changed.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::home::home,

        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::create_user,
        crate::api::users::update_user,

        crate::api::documents::list_documents,
        crate::api::documents::upload_document,
        crate::api::documents::archive_document,

        crate::api::announcements::list_announcements,
        crate::api::announcements::publish_announcement,

        crate::api::calendar::list_events,
        crate::api::calendar::create_event,
        crate::api::calendar::update_event,
        crate::api::calendar::delete_event,

        crate::api::permissions::list_permissions,
        crate::api::permissions::submit_permission,
        crate::api::permissions::get_permission,
        crate::api::permissions::cancel_permission,
        crate::api::permissions::edit_permission_form,
        crate::api::permissions::edit_permission,
        crate::api::permissions::permission_form_pdf,
        crate::api::permissions::admin_override_permission,

        crate::api::medical_leaves::list_medical_leaves,
        crate::api::medical_leaves::register_medical_leave,

        crate::api::activity::list_activity,
        crate::api::media::serve_media
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            NewUser,
            Role,
            User,
            UserListResponse,
            HomeSummary,
            Document,
            DocumentKind,
            DocumentUpload,
            DocumentListResponse,
            Announcement,
            AnnouncementKind,
            AnnouncementUpload,
            AnnouncementListResponse,
            CalendarEvent,
            EventKind,
            CreateEvent,
            EventListResponse,
            PermissionKind,
            PermissionStatus,
            PermissionView,
            PermissionUpload,
            PermissionListResponse,
            EditPrefill,
            MedicalLeave,
            MedicalLeaveKind,
            MedicalLeaveUpload,
            MedicalLeaveListResponse,
            ActivityLogEntry,
            ActivityListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Home", description = "Dashboard"),
        (name = "User", description = "Staff accounts"),
        (name = "Document", description = "Shared documents"),
        (name = "Announcement", description = "Announcements"),
        (name = "Calendar", description = "Center events"),
        (name = "Permission", description = "Permission requests"),
        (name = "MedicalLeave", description = "Medical leaves"),
        (name = "Activity", description = "Audit trail"),
        (name = "Media", description = "Stored uploads"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_permission_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/v1/permissions/{id}/cancel"));
        assert!(doc.paths.paths.contains_key("/api/v1/permissions/form.pdf"));
        assert!(doc.paths.paths.contains_key("/api/v1/admin/permissions/{id}"));
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
