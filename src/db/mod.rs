//! Persistent storage for user accounts and access tokens.
//!
//! - **Turso/SQLite** via `libsql`: local file, in-memory, or remote Turso
//!   (behind the `turso` feature).
//! - [`DatabaseClient`]: the store seam the services depend on.

#![allow(missing_docs)]

pub mod traits;
pub mod turso;

// Re-exports
pub use traits::{DatabaseClient, DatabaseProvider};
pub use turso::{AccessToken, NewAccessToken, NewUser, TursoClient, User, UserChanges};
