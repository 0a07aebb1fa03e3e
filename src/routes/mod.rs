pub mod announcements;
pub mod auth;
pub mod classes;

pub use announcements::configure_announcements_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_classes_routes;
