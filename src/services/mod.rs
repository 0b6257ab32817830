//! Business rules behind the HTTP handlers.
//!
//! Handlers parse requests and shape responses; everything that decides
//! whether an operation is allowed lives here.

/// Registration, login and logout.
pub mod auth;
/// Administrative user CRUD.
pub mod users;

pub use auth::AuthService;
pub use users::UserAdminService;
