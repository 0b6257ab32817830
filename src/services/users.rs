use super::auth::email_conflict;
use crate::auth::password::hash_password;
use crate::db::{DatabaseClient, NewUser, User, UserChanges};
use crate::types::{
    structural_errors, AppError, CreateUserRequest, FieldErrors, Result, Role, UpdateUserRequest,
    EMAIL_TAKEN, ONLY_ADMIN_UPDATABLE, ROLE_REJECTED, USER_NOT_FOUND,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Administrative CRUD over user accounts.
#[derive(Clone)]
pub struct UserAdminService {
    db: Arc<dyn DatabaseClient>,
}

impl UserAdminService {
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.db.list_users().await
    }

    /// Creates an account on behalf of an administrator.
    ///
    /// Structural problems are a validation error; a role outside the known
    /// set is checked afterwards and rejected on its own. Store failures
    /// become [`AppError::Persistence`].
    pub async fn create(&self, request: CreateUserRequest) -> Result<User> {
        let mut errors = structural_errors(&request);
        self.check_email_available(request.email.as_deref(), None, &mut errors)
            .await?;
        errors.into_result()?;

        let (Some(name), Some(email), Some(password), Some(role)) =
            (request.name, request.email, request.password, request.role)
        else {
            return Err(AppError::Internal(
                "validated create request is missing a field".to_string(),
            ));
        };

        let role: Role = role
            .parse()
            .map_err(|_| AppError::InvalidInput(ROLE_REJECTED.to_string()))?;

        let password_hash = hash_password(&password)
            .map_err(|e| AppError::Persistence(format!("hashing failed: {}", e)))?;

        let user = self
            .db
            .create_user(&NewUser {
                name,
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match email_conflict(e) {
                AppError::Validation(errors) => AppError::Validation(errors),
                other => {
                    error!("Failed to create user: {}", other);
                    AppError::Persistence(other.to_string())
                }
            })?;

        info!(user_id = user.id, role = %user.role, "User created by administrator");
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        self.db
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
    }

    /// Applies a partial update.
    ///
    /// Only accounts whose current role is `admin` may be updated, whatever
    /// the payload. Absent fields and an empty password are left unchanged.
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> Result<User> {
        let request = request.normalized();
        let target = self.get(id).await?;

        if target.role != Role::Admin {
            warn!(user_id = id, role = %target.role, "Rejected update of non-admin user");
            return Err(AppError::Forbidden(ONLY_ADMIN_UPDATABLE.to_string()));
        }

        let mut errors = request.field_errors();
        self.check_email_available(request.email.as_deref(), Some(id), &mut errors)
            .await?;
        errors.into_result()?;

        let role = match request.role.as_deref() {
            Some(role) => Some(
                role.parse::<Role>()
                    .map_err(|_| AppError::Unprocessable(ROLE_REJECTED.to_string()))?,
            ),
            None => None,
        };

        let password_hash = match request.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let changes = UserChanges {
            name: request.name,
            email: request.email,
            password_hash,
            role,
        };

        let user = self
            .db
            .update_user(id, &changes)
            .await
            .map_err(email_conflict)?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

        info!(user_id = id, "User updated");
        Ok(user)
    }

    /// Deletes the account and every token it holds.
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.db.delete_user(id).await? {
            return Err(AppError::NotFound(USER_NOT_FOUND.to_string()));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Adds the email-taken error when `email` belongs to an account other
    /// than `exclude`. Skipped if the email already failed another rule.
    async fn check_email_available(
        &self,
        email: Option<&str>,
        exclude: Option<i64>,
        errors: &mut FieldErrors,
    ) -> Result<()> {
        if errors.has("email") {
            return Ok(());
        }

        if let Some(email) = email {
            if let Some(existing) = self.db.get_user_by_email(email).await? {
                if Some(existing.id) != exclude {
                    errors.add("email", EMAIL_TAKEN);
                }
            }
        }

        Ok(())
    }
}
