use crate::db::{DatabaseClient, NewAccessToken, User};
use crate::types::{AppError, Result};
use crate::utils::toml_config::ConfigManager;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;

/// Number of random bytes behind a token secret (40 hex characters).
const SECRET_BYTES: usize = 20;

/// Issues, resolves and revokes opaque bearer tokens.
///
/// The plaintext handed to clients is `{prefix}{id}|{secret}`. Only the
/// SHA-256 of the secret is stored, so a leaked database cannot be replayed.
#[derive(Clone)]
pub struct TokenService {
    db: Arc<dyn DatabaseClient>,
    config: Arc<ConfigManager>,
}

impl TokenService {
    pub fn new(db: Arc<dyn DatabaseClient>, config: Arc<ConfigManager>) -> Self {
        Self { db, config }
    }

    /// Creates and stores a new token for `user`, returning its plaintext.
    pub async fn issue(&self, user: &User) -> Result<String> {
        let auth = self.config.config().auth.clone();
        let secret = generate_secret();

        let expires_at = match auth.token_expiry_minutes {
            Some(minutes) => Some(expiry_timestamp(minutes)?),
            None => None,
        };

        let stored = self
            .db
            .create_token(&NewAccessToken {
                user_id: user.id,
                name: auth.token_name,
                token_hash: hash_token(&secret),
                expires_at,
            })
            .await?;

        debug!(user_id = user.id, token_id = stored.id, "Issued access token");

        Ok(format!("{}{}|{}", auth.token_prefix, stored.id, secret))
    }

    /// Resolves a plaintext token to its owner.
    ///
    /// Unknown, malformed, expired and orphaned tokens all yield `Ok(None)`.
    pub async fn authenticate(&self, plaintext: &str) -> Result<Option<User>> {
        let prefix = self.config.config().auth.token_prefix.clone();
        let token = match plaintext.strip_prefix(prefix.as_str()) {
            Some(rest) => rest,
            None => return Ok(None),
        };

        let (expected_id, secret) = match token.split_once('|') {
            Some((id, secret)) => match id.parse::<i64>() {
                Ok(id) => (Some(id), secret),
                Err(_) => return Ok(None),
            },
            None => (None, token),
        };

        if secret.is_empty() {
            return Ok(None);
        }

        let stored = match self.db.get_token_by_hash(&hash_token(secret)).await? {
            Some(stored) => stored,
            None => return Ok(None),
        };

        if expected_id.is_some_and(|id| id != stored.id) {
            return Ok(None);
        }

        if stored.is_expired(Utc::now().timestamp()) {
            debug!(token_id = stored.id, "Rejected expired token");
            return Ok(None);
        }

        let user = match self.db.get_user_by_id(stored.user_id).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        self.db.touch_token(stored.id).await?;

        Ok(Some(user))
    }

    /// Deletes every token belonging to `user_id`.
    pub async fn revoke_all(&self, user_id: i64) -> Result<u64> {
        let revoked = self.db.delete_user_tokens(user_id).await?;
        debug!(user_id, revoked, "Revoked access tokens");
        Ok(revoked)
    }
}

/// Unix timestamp `minutes` from now, or an error when it is out of range.
fn expiry_timestamp(minutes: i64) -> Result<i64> {
    Duration::try_minutes(minutes)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .map(|at| at.timestamp())
        .ok_or_else(|| {
            AppError::Internal(format!(
                "token expiry of {} minutes is out of range",
                minutes
            ))
        })
}

fn generate_secret() -> String {
    hex::encode(rand::random::<[u8; SECRET_BYTES]>())
}

/// Hashes a token secret using SHA256 for storage.
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseProvider, NewUser};
    use crate::types::Role;
    use crate::utils::toml_config::UsuariosConfig;

    async fn setup(config: UsuariosConfig) -> (TokenService, Arc<dyn DatabaseClient>, User) {
        let db = DatabaseProvider::Memory
            .create_client()
            .await
            .expect("should create memory db");
        let user = db
            .create_user(&NewUser {
                name: "Juan".to_string(),
                email: "juan@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Usuario,
            })
            .await
            .expect("should create user");

        let service = TokenService::new(db.clone(), Arc::new(ConfigManager::from_config(config)));
        (service, db, user)
    }

    #[test]
    fn test_hash_token() {
        let hash1 = hash_token("some-token");
        let hash2 = hash_token("some-token");

        // Same token should produce same hash
        assert_eq!(hash1, hash2, "same token should hash to same value");

        // Hash should be a hex string (64 chars for SHA256)
        assert_eq!(hash1.len(), 64, "SHA256 hash should be 64 hex characters");
        assert!(
            hash1.chars().all(|c| c.is_ascii_hexdigit()),
            "hash should be hex"
        );
        assert_ne!(hash1, hash_token("other-token"));
    }

    #[tokio::test]
    async fn test_issue_format() {
        let (service, _, user) = setup(UsuariosConfig::default()).await;

        let token = service.issue(&user).await.expect("should issue");
        let (id, secret) = token.split_once('|').expect("should contain separator");

        assert!(id.parse::<i64>().is_ok());
        assert_eq!(secret.len(), SECRET_BYTES * 2);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_issued_tokens_are_distinct() {
        let (service, _, user) = setup(UsuariosConfig::default()).await;

        let first = service.issue(&user).await.unwrap();
        let second = service.issue(&user).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_authenticate_round_trip() {
        let (service, _, user) = setup(UsuariosConfig::default()).await;
        let token = service.issue(&user).await.unwrap();

        let resolved = service.authenticate(&token).await.unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let (service, _, user) = setup(UsuariosConfig::default()).await;
        let token = service.issue(&user).await.unwrap();
        let (_, secret) = token.split_once('|').unwrap();

        assert!(service.authenticate("").await.unwrap().is_none());
        assert!(service.authenticate("abc").await.unwrap().is_none());
        assert!(service.authenticate("x|y").await.unwrap().is_none());
        assert!(service
            .authenticate(&format!("999999|{}", secret))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_authenticate_honours_prefix() {
        let mut config = UsuariosConfig::default();
        config.auth.token_prefix = "usr_".to_string();
        let (service, _, user) = setup(config).await;

        let token = service.issue(&user).await.unwrap();
        assert!(token.starts_with("usr_"));

        assert!(service.authenticate(&token).await.unwrap().is_some());
        let bare = token.trim_start_matches("usr_");
        assert!(service.authenticate(bare).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_expired() {
        let (service, db, user) = setup(UsuariosConfig::default()).await;
        let secret = "0123456789abcdef0123456789abcdef01234567";
        let stored = db
            .create_token(&NewAccessToken {
                user_id: user.id,
                name: "api-token".to_string(),
                token_hash: hash_token(secret),
                expires_at: Some(Utc::now().timestamp() - 60),
            })
            .await
            .unwrap();

        let token = format!("{}|{}", stored.id, secret);
        assert!(service.authenticate(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expiry_from_config() {
        let mut config = UsuariosConfig::default();
        config.auth.token_expiry_minutes = Some(30);
        let (service, db, user) = setup(config).await;

        let token = service.issue(&user).await.unwrap();
        let (_, secret) = token.split_once('|').unwrap();
        let stored = db.get_token_by_hash(&hash_token(secret)).await.unwrap().unwrap();

        let expires_at = stored.expires_at.expect("should carry an expiry");
        let expected = Utc::now().timestamp() + 30 * 60;
        assert!((expires_at - expected).abs() <= 5);
    }

    #[tokio::test]
    async fn test_out_of_range_expiry_is_an_error() {
        let mut config = UsuariosConfig::default();
        config.auth.token_expiry_minutes = Some(i64::MAX);
        let (service, _, user) = setup(config).await;

        assert!(matches!(service.issue(&user).await, Err(AppError::Internal(_))));
        assert!(expiry_timestamp(60).is_ok());
    }

    #[tokio::test]
    async fn test_revoke_all() {
        let (service, _, user) = setup(UsuariosConfig::default()).await;
        let first = service.issue(&user).await.unwrap();
        let second = service.issue(&user).await.unwrap();

        assert_eq!(service.revoke_all(user.id).await.unwrap(), 2);
        assert!(service.authenticate(&first).await.unwrap().is_none());
        assert!(service.authenticate(&second).await.unwrap().is_none());
    }
}
