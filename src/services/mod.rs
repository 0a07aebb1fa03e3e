pub mod announcements;
pub mod auth;
pub mod classes;

pub use announcements::AnnouncementService;
pub use auth::AuthService;
pub use classes::ClassService;
