//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

use crate::types::{AppError, USER_NOT_FOUND};
use axum::extract::{rejection::JsonRejection, FromRequest};
use serde::de::DeserializeOwned;

/// Authentication handlers (register, login, logout, current user).
pub mod auth;
/// User administration handlers under `/usuarios`.
pub mod users;

/// JSON body extractor whose rejections render like every other API error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Unprocessable(rejection.body_text())
    }
}

/// Parses a JSON body that may be left out entirely, in which case the
/// payload's default is used. Unlike [`JsonBody`] no content type is required.
pub(crate) fn optional_json<T>(body: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        AppError::Unprocessable(format!(
            "Failed to parse the request body as JSON: {}",
            e
        ))
    })
}

/// Route ids that are not integers cannot name a user.
pub(crate) fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::NotFound(USER_NOT_FOUND.to_string()))
}
