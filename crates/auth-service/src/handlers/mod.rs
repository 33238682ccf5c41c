pub mod auth_handler;
pub mod health;
pub mod jwks_handler;
pub mod user_handler;

pub use auth_handler::{handle_login, handle_logout, handle_refresh};
pub use health::{health_check, metrics_handler};
pub use jwks_handler::{handle_get_jwks, handle_openid_configuration};
pub use user_handler::{handle_delete_me, handle_get_internal_user, handle_get_me, handle_signup};
