pub mod activity_log;
pub mod announcement;
pub mod calendar_event;
pub mod document;
pub mod medical_leave;
pub mod permission_request;
pub mod role;
pub mod user;
