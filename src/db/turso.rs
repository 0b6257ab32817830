use crate::types::{AppError, Result, Role};
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row, Value};
use tracing::debug;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";
const TOKEN_COLUMNS: &str = "id, user_id, name, token_hash, last_used_at, expires_at, created_at";

/// libsql-backed store for users and access tokens.
///
/// A single connection is opened at construction and shared; for `:memory:`
/// databases this is what keeps the data alive across calls.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
}

impl TursoClient {
    /// Ephemeral in-memory SQLite database.
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    /// File-backed SQLite database. Parent directories are created on demand.
    pub async fn new_local(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::Database(format!("Failed to create database directory: {}", e))
                    })?;
                }
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        Self::from_database(db).await
    }

    /// Remote Turso database.
    #[cfg(feature = "turso")]
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub fn connection(&self) -> Result<Connection> {
        Ok(self.conn.clone())
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        // Users table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('admin', 'usuario')),
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        // Access tokens table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS personal_access_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                token_hash TEXT NOT NULL UNIQUE,
                last_used_at INTEGER,
                expires_at INTEGER,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create tokens table: {}", e)))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tokens_user ON personal_access_tokens(user_id)",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create tokens index: {}", e)))?;

        Ok(())
    }

    // User operations
    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                &format!(
                    "INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?)
                     RETURNING {}",
                    USER_COLUMNS
                ),
                (
                    user.name.as_str(),
                    user.email.as_str(),
                    user.password_hash.as_str(),
                    user.role.as_str(),
                    now,
                    now,
                ),
            )
            .await
            .map_err(|e| write_error("create user", e))?;

        let row = rows
            .next()
            .await
            .map_err(|e| write_error("create user", e))?
            .ok_or_else(|| AppError::Database("Insert returned no row".to_string()))?;

        let created = User::from_row(&row)?;
        debug!(user_id = created.id, "user row inserted");
        Ok(created)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.query_one_user(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            Value::Integer(id),
        )
        .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_one_user(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
            Value::Text(email.to_string()),
        )
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                &format!("SELECT {} FROM users ORDER BY id ASC", USER_COLUMNS),
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query users: {}", e)))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(db_err)?
        {
            users.push(User::from_row(&row)?);
        }

        Ok(users)
    }

    /// Applies only the `Some` fields of `changes`. Returns `None` when the
    /// user does not exist.
    pub async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                &format!(
                    "UPDATE users SET
                        name = COALESCE(?, name),
                        email = COALESCE(?, email),
                        password_hash = COALESCE(?, password_hash),
                        role = COALESCE(?, role),
                        updated_at = ?
                     WHERE id = ?
                     RETURNING {}",
                    USER_COLUMNS
                ),
                (
                    changes.name.clone(),
                    changes.email.clone(),
                    changes.password_hash.clone(),
                    changes.role.map(|r| r.as_str().to_string()),
                    now,
                    id,
                ),
            )
            .await
            .map_err(|e| write_error("update user", e))?;

        match rows
            .next()
            .await
            .map_err(|e| write_error("update user", e))?
        {
            Some(row) => Ok(Some(User::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Deletes the user and its tokens. Returns `false` when no such user.
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let conn = self.connection()?;

        conn.execute(
            "DELETE FROM personal_access_tokens WHERE user_id = ?",
            [id],
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete user tokens: {}", e)))?;

        let affected = conn
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        Ok(affected > 0)
    }

    // Token operations
    pub async fn create_token(&self, token: &NewAccessToken) -> Result<AccessToken> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                &format!(
                    "INSERT INTO personal_access_tokens (user_id, name, token_hash, expires_at, created_at)
                     VALUES (?, ?, ?, ?, ?)
                     RETURNING {}",
                    TOKEN_COLUMNS
                ),
                (
                    token.user_id,
                    token.name.as_str(),
                    token.token_hash.as_str(),
                    token.expires_at,
                    now,
                ),
            )
            .await
            .map_err(|e| write_error("create token", e))?;

        let row = rows
            .next()
            .await
            .map_err(|e| write_error("create token", e))?
            .ok_or_else(|| AppError::Database("Insert returned no row".to_string()))?;

        AccessToken::from_row(&row)
    }

    pub async fn get_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM personal_access_tokens WHERE token_hash = ?",
                    TOKEN_COLUMNS
                ),
                [token_hash],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query token: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(db_err)?
        {
            Some(row) => Ok(Some(AccessToken::from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn touch_token(&self, id: i64) -> Result<()> {
        let conn = self.connection()?;
        let now = Utc::now().timestamp();

        conn.execute(
            "UPDATE personal_access_tokens SET last_used_at = ? WHERE id = ?",
            (now, id),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to touch token: {}", e)))?;

        Ok(())
    }

    pub async fn delete_user_tokens(&self, user_id: i64) -> Result<u64> {
        let conn = self.connection()?;

        conn.execute(
            "DELETE FROM personal_access_tokens WHERE user_id = ?",
            [user_id],
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete tokens: {}", e)))
    }

    async fn query_one_user(&self, sql: &str, key: Value) -> Result<Option<User>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(sql, [key])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(db_err)?
        {
            Some(row) => Ok(Some(User::from_row(&row)?)),
            None => Ok(None),
        }
    }
}

/// Unique-index violations become [`AppError::Conflict`]; the rest are
/// plain database errors.
fn write_error(context: &str, e: libsql::Error) -> AppError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint failed") {
        AppError::Conflict(message)
    } else {
        AppError::Database(format!("Failed to {}: {}", context, message))
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Database(format!("Invalid timestamp in row: {}", secs)))
}

fn db_err(e: libsql::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn nullable_int(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row.get_value(idx).map_err(db_err)? {
        Value::Null => Ok(None),
        Value::Integer(v) => Ok(Some(v)),
        other => Err(AppError::Database(format!(
            "Unexpected value in column {}: {:?}",
            idx, other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    fn from_row(row: &Row) -> Result<Self> {
        let role: String = row.get(4).map_err(db_err)?;
        Ok(Self {
            id: row.get(0).map_err(db_err)?,
            name: row.get(1).map_err(db_err)?,
            email: row.get(2).map_err(db_err)?,
            password_hash: row.get(3).map_err(db_err)?,
            role: role
                .parse()
                .map_err(|e| AppError::Database(format!("Corrupt user row: {}", e)))?,
            created_at: timestamp(row.get(5).map_err(db_err)?)?,
            updated_at: timestamp(row.get(6).map_err(db_err)?)?,
        })
    }
}

/// Fields for inserting a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone)]
pub struct NewAccessToken {
    pub user_id: i64,
    pub name: String,
    pub token_hash: String,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub token_hash: String,
    pub last_used_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub created_at: i64,
}

impl AccessToken {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get(0).map_err(db_err)?,
            user_id: row.get(1).map_err(db_err)?,
            name: row.get(2).map_err(db_err)?,
            token_hash: row.get(3).map_err(db_err)?,
            last_used_at: nullable_int(row, 4)?,
            expires_at: nullable_int(row, 5)?,
            created_at: row.get(6).map_err(db_err)?,
        })
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}
