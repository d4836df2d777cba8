pub mod auth;
pub mod logging;

pub use auth::{require_auth, AuthenticatedUser};
pub use logging::log_requests;
