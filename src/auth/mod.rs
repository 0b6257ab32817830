//! Credential hashing, bearer tokens and the authentication middleware.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id password hashing
//! - [`auth::tokens`](crate::auth::tokens) - opaque token issuance, lookup and revocation
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and the [`AuthUser`](middleware::AuthUser) extractor
//!
//! # Tokens
//!
//! Tokens are opaque strings of the form `{prefix}{id}|{secret}`. The
//! database keeps only a SHA-256 hash of the secret. A token stays valid
//! until it is revoked (logout, user deletion) or, when
//! `auth.token_expiry_minutes` is set, until it expires.
//!
//! ## Extracting the current user in handlers
//!
//! ```ignore
//! async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
//!     Json(user.into())
//! }
//! ```
//!
//! # Configuration
//!
//! Configure via `usuarios.toml`:
//! ```toml
//! [auth]
//! token_name = "api-token"
//! token_prefix = ""
//! token_expiry_minutes = 1440  # omit for tokens that never expire
//! ```

/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Password hashing and verification.
pub mod password;
/// Opaque bearer token issuance and verification.
pub mod tokens;
