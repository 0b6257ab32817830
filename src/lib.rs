//! # usuarios-api
//!
//! A user account REST API with opaque bearer tokens: sign-up, login and
//! logout, plus administrative CRUD over accounts.
//!
//! ## Overview
//!
//! The crate can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `usuarios-server` binary
//! 2. **As a library** - Build the router into your own Axum application
//!
//! ### Embedding the API
//!
//! ```rust,ignore
//! use usuarios::{api::routes::app, AppState, ConfigManager, UsuariosConfig};
//! use std::sync::Arc;
//!
//! let config = Arc::new(ConfigManager::from_config(UsuariosConfig::default()));
//! let state = AppState::new(config).await?;
//! let router = app(state);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-db` | Local SQLite database (default) |
//! | `turso` | Remote Turso database |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Password hashing, bearer tokens and middleware
//! - [`db`] - Database abstraction (SQLite, Turso)
//! - [`services`] - Account rules behind the handlers
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration with hot reload

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Token authentication and middleware.
pub mod auth;
/// Command-line interface of the server binary.
pub mod cli;
/// Database clients (Turso/SQLite).
pub mod db;
/// Registration, login and user administration.
pub mod services;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use db::{DatabaseClient, DatabaseProvider, TursoClient};
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigManager, UsuariosConfig};

use crate::auth::tokens::TokenService;
use crate::services::{AuthService, UserAdminService};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration with hot-reload support
    pub config_manager: Arc<ConfigManager>,
    /// Database client
    pub db: Arc<dyn DatabaseClient>,
    /// Bearer token issuance and lookup
    pub tokens: TokenService,
    /// Registration, login and logout
    pub auth_service: Arc<AuthService>,
    /// User administration
    pub user_service: Arc<UserAdminService>,
}

impl AppState {
    /// Opens the database selected by `[database]` and wires the services.
    pub async fn new(config_manager: Arc<ConfigManager>) -> Result<Self> {
        let provider = DatabaseProvider::from_config(&config_manager.config().database);
        let db = provider.create_client().await?;
        Ok(Self::with_database(config_manager, db))
    }

    /// Wires the services around an existing database client.
    pub fn with_database(config_manager: Arc<ConfigManager>, db: Arc<dyn DatabaseClient>) -> Self {
        let tokens = TokenService::new(db.clone(), config_manager.clone());
        let auth_service = Arc::new(AuthService::new(db.clone(), tokens.clone()));
        let user_service = Arc::new(UserAdminService::new(db.clone()));

        Self {
            config_manager,
            db,
            tokens,
            auth_service,
            user_service,
        }
    }
}
