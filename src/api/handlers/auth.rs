use super::JsonBody;
use crate::{
    auth::middleware::AuthUser,
    types::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, Result, UserResponse},
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};

/// Register a new account and return it with a fresh token.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = state.auth_service.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Usuario registrado exitosamente".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (user, token) = state.auth_service.login(payload).await?;

    Ok(Json(AuthResponse {
        message: "Login exitoso".to_string(),
        user: user.into(),
        token,
    }))
}

/// Revoke every token of the caller
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageResponse>> {
    state.auth_service.logout(&user).await?;

    Ok(Json(MessageResponse::new("Logout exitoso, tokens revocados")))
}

/// The authenticated account
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}
