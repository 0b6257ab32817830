use crate::auth::password::{hash_password, verify_password};
use crate::auth::tokens::TokenService;
use crate::db::{DatabaseClient, NewUser, User};
use crate::types::{
    structural_errors, AppError, FieldErrors, LoginRequest, RegisterRequest, Result, Role,
    EMAIL_TAKEN, INVALID_CREDENTIALS, ROLE_NOT_IN_SET,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Self-service account flows: sign-up, login and logout.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<dyn DatabaseClient>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(db: Arc<dyn DatabaseClient>, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    /// Validates the payload, stores the account and issues its first token.
    ///
    /// Every failing field is reported in one validation error, including a
    /// role outside the known set and an email that is already registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<(User, String)> {
        let mut errors = structural_errors(&request);

        if !errors.has("role") {
            if let Some(role) = request.role.as_deref() {
                if role.parse::<Role>().is_err() {
                    errors.add("role", ROLE_NOT_IN_SET);
                }
            }
        }

        if !errors.has("email") {
            if let Some(email) = request.email.as_deref() {
                if self.db.get_user_by_email(email).await?.is_some() {
                    errors.add("email", EMAIL_TAKEN);
                }
            }
        }

        errors.into_result()?;

        let (Some(name), Some(email), Some(password), Some(role)) =
            (request.name, request.email, request.password, request.role)
        else {
            return Err(AppError::Internal(
                "validated register request is missing a field".to_string(),
            ));
        };
        let role: Role = role
            .parse()
            .map_err(|e| AppError::Internal(format!("validated role rejected: {}", e)))?;

        let user = self
            .db
            .create_user(&NewUser {
                name,
                email,
                password_hash: hash_password(&password)?,
                role,
            })
            .await
            .map_err(email_conflict)?;

        let token = match self.tokens.issue(&user).await {
            Ok(token) => token,
            Err(e) => {
                // Leave no account behind that the client never got a token for
                if let Err(cleanup) = self.db.delete_user(user.id).await {
                    error!(user_id = user.id, "Failed to roll back registration: {}", cleanup);
                }
                return Err(e);
            }
        };
        info!(user_id = user.id, role = %user.role, "User registered");

        Ok((user, token))
    }

    /// Checks credentials and issues a new token. Earlier tokens stay valid.
    pub async fn login(&self, request: LoginRequest) -> Result<(User, String)> {
        structural_errors(&request).into_result()?;

        let (Some(email), Some(password)) = (request.email, request.password) else {
            return Err(AppError::Internal(
                "validated login request is missing a field".to_string(),
            ));
        };

        let user = match self.db.get_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!("Login attempt for unknown email");
                return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&password, &user.password_hash)? {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.tokens.issue(&user).await?;
        info!(user_id = user.id, "User logged in");

        Ok((user, token))
    }

    /// Revokes every token of `user`, not only the one used for the request.
    pub async fn logout(&self, user: &User) -> Result<()> {
        let revoked = self.tokens.revoke_all(user.id).await?;
        info!(user_id = user.id, revoked, "User logged out");
        Ok(())
    }
}

/// A unique-index violation means another request registered the same
/// email first; report it the same way as the pre-insert check does.
pub(crate) fn email_conflict(error: AppError) -> AppError {
    match error {
        AppError::Conflict(_) => AppError::Validation(FieldErrors::single("email", EMAIL_TAKEN)),
        other => other,
    }
}
