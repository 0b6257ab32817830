//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication (`/api`)
//! - `POST /api/register` - Register a new user and receive a token
//! - `POST /api/login` - Login and receive a token
//! - `POST /api/logout` - Revoke every token of the caller
//! - `GET /api/user` - The authenticated user
//!
//! ## Users (`/api/usuarios`)
//! - `GET /api/usuarios/listUsers` - List users
//! - `POST /api/usuarios/addUser` - Create a user
//! - `GET /api/usuarios/getUser/{id}` - Get a user
//! - `PUT /api/usuarios/updateUser/{id}` - Update an admin user
//! - `DELETE /api/usuarios/deleteUser/{id}` - Delete a user
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! Everything except register, login and health requires a token in the
//! `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
