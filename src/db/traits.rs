//! Database abstraction traits
//!
//! This module provides the `DatabaseClient` trait that abstracts over the
//! storage backends (in-memory SQLite, file-based SQLite, remote Turso).
//! Services hold an `Arc<dyn DatabaseClient>` and never see the backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use usuarios::db::DatabaseProvider;
//!
//! // Use in-memory database (default for development/testing)
//! let db = DatabaseProvider::Memory.create_client().await?;
//!
//! // Use file-based SQLite
//! let db = DatabaseProvider::SQLite { path: "data.db".into() }.create_client().await?;
//! ```

use super::turso::{AccessToken, NewAccessToken, NewUser, User, UserChanges};
use crate::types::Result;
use crate::utils::toml_config::DatabaseConfig;
use async_trait::async_trait;
use std::sync::Arc;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    #[cfg(feature = "turso")]
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Create a database client from this provider configuration
    pub async fn create_client(&self) -> Result<Arc<dyn DatabaseClient>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Arc::new(client))
            }
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, auth_token } => {
                let client =
                    super::turso::TursoClient::new_remote(url.clone(), auth_token.clone()).await?;
                Ok(Arc::new(client))
            }
        }
    }

    /// Pick a backend from the `[database]` section.
    ///
    /// Turso wins when both of its env vars are configured and set (and the
    /// `turso` feature is compiled in); otherwise `url` selects a file, with
    /// `:memory:` meaning an ephemeral database.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        #[cfg(feature = "turso")]
        {
            if let (Some(url_env), Some(token_env)) =
                (&config.turso_url_env, &config.turso_token_env)
            {
                if let (Ok(url), Ok(token)) = (std::env::var(url_env), std::env::var(token_env)) {
                    if !url.is_empty() && !token.is_empty() {
                        return DatabaseProvider::Turso {
                            url,
                            auth_token: token,
                        };
                    }
                }
            }
        }

        if config.url.is_empty() || config.url == ":memory:" {
            DatabaseProvider::Memory
        } else {
            DatabaseProvider::SQLite {
                path: config.url.clone(),
            }
        }
    }
}

/// Abstract trait for database operations
///
/// Implementations must enforce email uniqueness atomically and report a
/// violation as [`AppError::Conflict`](crate::types::AppError::Conflict).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    // ============== User Operations ==============

    /// Insert a user and return the stored row (with its assigned id)
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Get a user by ID
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get a user by exact email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// All users in id order
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Apply a partial update; `None` when the user does not exist
    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>>;

    /// Delete a user and its tokens; `false` when the user does not exist
    async fn delete_user(&self, id: i64) -> Result<bool>;

    // ============== Token Operations ==============

    /// Store a hashed access token
    async fn create_token(&self, token: &NewAccessToken) -> Result<AccessToken>;

    /// Look up a token by the hash of its secret
    async fn get_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>>;

    /// Record a successful use of a token
    async fn touch_token(&self, id: i64) -> Result<()>;

    /// Revoke every token of a user, returning how many were removed
    async fn delete_user_tokens(&self, user_id: i64) -> Result<u64>;
}

// ============== Implement DatabaseClient for TursoClient ==============

#[async_trait]
impl DatabaseClient for super::turso::TursoClient {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        super::turso::TursoClient::create_user(self, user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        super::turso::TursoClient::get_user_by_id(self, id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        super::turso::TursoClient::get_user_by_email(self, email).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        super::turso::TursoClient::list_users(self).await
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>> {
        super::turso::TursoClient::update_user(self, id, changes).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        super::turso::TursoClient::delete_user(self, id).await
    }

    async fn create_token(&self, token: &NewAccessToken) -> Result<AccessToken> {
        super::turso::TursoClient::create_token(self, token).await
    }

    async fn get_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>> {
        super::turso::TursoClient::get_token_by_hash(self, token_hash).await
    }

    async fn touch_token(&self, id: i64) -> Result<()> {
        super::turso::TursoClient::touch_token(self, id).await
    }

    async fn delete_user_tokens(&self, user_id: i64) -> Result<u64> {
        super::turso::TursoClient::delete_user_tokens(self, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_config_memory() {
        let config = DatabaseConfig {
            url: ":memory:".to_string(),
            ..Default::default()
        };
        assert_eq!(DatabaseProvider::from_config(&config), DatabaseProvider::Memory);
    }

    #[test]
    fn test_provider_from_config_file() {
        let config = DatabaseConfig {
            url: "./data/test.db".to_string(),
            ..Default::default()
        };
        assert_eq!(
            DatabaseProvider::from_config(&config),
            DatabaseProvider::SQLite {
                path: "./data/test.db".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_memory_provider_creates_usable_client() {
        let db = DatabaseProvider::Memory
            .create_client()
            .await
            .expect("should create memory client");

        assert!(db.list_users().await.expect("should list").is_empty());
    }
}
