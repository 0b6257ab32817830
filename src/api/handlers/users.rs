use super::{optional_json, parse_user_id, JsonBody};
use crate::{
    types::{
        CreateUserRequest, MessageResponse, Result, StatusResponse, UpdateUserRequest,
        UpdatedUserResponse, UserResponse,
    },
    AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

/// List every user in creation order
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.user_service.list().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create a user on behalf of an administrator
pub async fn add_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<Json<StatusResponse>> {
    state.user_service.create(payload).await?;

    Ok(Json(StatusResponse {
        message: "Usuario creado correctamente".to_string(),
        status: true,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user = state.user_service.get(parse_user_id(&id)?).await?;

    Ok(Json(user.into()))
}

/// Partially update an admin account.
///
/// Every field is optional, so a request without a body is an empty update.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<UpdatedUserResponse>> {
    let id = parse_user_id(&id)?;
    let payload: UpdateUserRequest = optional_json(&body)?;

    let user = state.user_service.update(id, payload).await?;

    Ok(Json(UpdatedUserResponse {
        message: "Usuario actualizado correctamente".to_string(),
        data: user.into(),
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.user_service.delete(parse_user_id(&id)?).await?;

    Ok(Json(MessageResponse::new("Usuario eliminado correctamente")))
}
