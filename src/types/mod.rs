use crate::db::User;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

// ============= Response Messages =============

/// Body message for any bearer-protected route reached without a usable token.
pub const UNAUTHENTICATED: &str = "No autenticado. Token inválido o ausente.";
/// Single message for unknown email and wrong password alike.
pub const INVALID_CREDENTIALS: &str = "Credenciales inválidas.";
pub const EMAIL_TAKEN: &str = "El email ya ha sido registrado.";
pub const ROLE_NOT_IN_SET: &str = "El rol seleccionado no es válido.";
pub const ROLE_REJECTED: &str = "El rol ingresado no es válido, debe ser \"admin\" o \"usuario\".";
pub const ONLY_ADMIN_UPDATABLE: &str = "Solo los usuarios con rol admin pueden ser actualizados.";
pub const NAME_REQUIRED: &str = "El campo nombre es obligatorio.";
pub const EMAIL_REQUIRED: &str = "El campo email es obligatorio.";
pub const ROLE_REQUIRED: &str = "El campo rol es obligatorio.";
pub const USER_NOT_FOUND: &str = "Usuario no encontrado.";
pub const USER_CREATE_FAILED: &str = "Error al crear el usuario";
pub const INTERNAL_ERROR: &str = "Error interno del servidor.";

// ============= Roles =============

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Usuario,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Usuario => "usuario",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "usuario" => Ok(Role::Usuario),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// ============= Authentication Types =============

/// Public sign-up payload. Every field is optional at the serde level so
/// that missing fields surface as validation errors rather than parse errors.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(alias = "nombre", default, deserialize_with = "input::trimmed")]
    #[validate(
        required(message = "El campo nombre es obligatorio."),
        length(min = 1, max = 150, message = "El nombre es obligatorio y no debe superar los 150 caracteres.")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "input::trimmed")]
    #[validate(
        required(message = "El campo email es obligatorio."),
        email(message = "El email debe ser una dirección de correo válida."),
        length(max = 150, message = "El email no debe superar los 150 caracteres.")
    )]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "input::non_empty")]
    #[validate(
        required(message = "El campo contraseña es obligatorio."),
        length(min = 6, message = "La contraseña debe tener al menos 6 caracteres.")
    )]
    pub password: Option<String>,

    #[serde(alias = "rol", default, deserialize_with = "input::trimmed")]
    #[validate(required(message = "El campo rol es obligatorio."))]
    pub role: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "input::trimmed")]
    #[validate(
        required(message = "El campo email es obligatorio."),
        email(message = "El email debe ser una dirección de correo válida.")
    )]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "input::non_empty")]
    #[validate(
        required(message = "El campo contraseña es obligatorio."),
        length(min = 1, message = "El campo contraseña es obligatorio.")
    )]
    pub password: Option<String>,
}

/// Register and login both answer with the account and a fresh token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

// ============= User Administration Types =============

/// Admin "add user" payload. Same shape as [`RegisterRequest`], but the role
/// is only required here; membership in the role set is checked afterwards.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(alias = "nombre", default, deserialize_with = "input::trimmed")]
    #[validate(
        required(message = "El campo nombre es obligatorio."),
        length(min = 1, max = 150, message = "El nombre es obligatorio y no debe superar los 150 caracteres.")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "input::trimmed")]
    #[validate(
        required(message = "El campo email es obligatorio."),
        email(message = "El email debe ser una dirección de correo válida."),
        length(max = 150, message = "El email no debe superar los 150 caracteres.")
    )]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "input::non_empty")]
    #[validate(
        required(message = "El campo contraseña es obligatorio."),
        length(min = 6, message = "La contraseña debe tener al menos 6 caracteres.")
    )]
    pub password: Option<String>,

    #[serde(alias = "rol", default, deserialize_with = "input::trimmed")]
    #[validate(
        required(message = "El campo rol es obligatorio."),
        length(min = 1, message = "El campo rol es obligatorio.")
    )]
    pub role: Option<String>,
}

/// Partial update. Absent fields are left untouched; an empty password
/// means "keep the current one".
///
/// `name`, `email` and `role` may be omitted but not cleared: a present
/// `null` or blank value deserializes to `Some("")` and fails as missing.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(alias = "nombre", default, deserialize_with = "input::present")]
    #[validate(length(min = 1, max = 150, message = "El nombre es obligatorio y no debe superar los 150 caracteres."))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "input::present")]
    #[validate(
        email(message = "El email debe ser una dirección de correo válida."),
        length(max = 150, message = "El email no debe superar los 150 caracteres.")
    )]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: Option<String>,

    #[serde(alias = "rol", default, deserialize_with = "input::present")]
    #[validate(length(min = 1, message = "El campo rol es obligatorio."))]
    pub role: Option<String>,
}

impl UpdateUserRequest {
    /// Drops an empty password so it neither fails validation nor gets hashed.
    pub fn normalized(mut self) -> Self {
        if self.password.as_deref().is_some_and(str::is_empty) {
            self.password = None;
        }
        self
    }

    /// Structural errors, with a cleared field reported only as missing.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let cleared = [
            ("name", &self.name, NAME_REQUIRED),
            ("email", &self.email, EMAIL_REQUIRED),
            ("role", &self.role, ROLE_REQUIRED),
        ];
        for (field, value, message) in cleared {
            if value.as_deref() == Some("") {
                errors.add(field, message);
            }
        }

        for (field, messages) in structural_errors(self).0 {
            if !errors.has(&field) {
                errors.0.insert(field, messages);
            }
        }
        errors
    }
}

/// Deserializers that normalize string input before validation.
mod input {
    use serde::{Deserialize, Deserializer};

    /// Trims surrounding whitespace; a blank or null value becomes `None`.
    pub fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    /// Keeps the value verbatim; an empty or null value becomes `None`.
    pub fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }

    /// Only called for keys present in the payload, so null maps to `Some("")`.
    pub fn present<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(Some(value.map(|s| s.trim().to_string()).unwrap_or_default()))
    }
}

/// Output-safe projection of a user. Never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedUserResponse {
    pub message: String,
    pub data: UserResponse,
}

// ============= Validation Errors =============

/// Field order used when picking the headline message of a validation error.
const FIELD_ORDER: [&str; 4] = ["name", "email", "password", "role"];

/// Per-field validation messages, rendered as the `errors` object of a 422.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a map holding a single message.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of messages across all fields.
    pub fn count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    fn ordered_messages(&self) -> impl Iterator<Item = &String> {
        let known = FIELD_ORDER.iter().filter_map(|f| self.0.get(*f));
        let rest = self
            .0
            .iter()
            .filter(|(k, _)| !FIELD_ORDER.contains(&k.as_str()))
            .map(|(_, v)| v);
        known.chain(rest).flatten()
    }

    /// Headline message: the first error plus a count of the remaining ones.
    pub fn summary(&self) -> String {
        let first = match self.ordered_messages().next() {
            Some(first) => first.clone(),
            None => return String::new(),
        };
        match self.count() - 1 {
            0 => first,
            1 => format!("{} (y 1 error más)", first),
            n => format!("{} (y {} errores más)", first, n),
        }
    }

    /// `Ok(())` when empty, otherwise a validation error carrying `self`.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, list) in errors.field_errors() {
            let field = field.to_string();
            for error in list.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.add(&field, message);
            }
        }
        out
    }
}

/// Runs the derive-based structural checks of a request.
pub fn structural_errors<T: Validate>(request: &T) -> FieldErrors {
    match request.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors.into(),
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Unauthenticated request")]
    Unauthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {}", .0.summary())]
    Validation(FieldErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Business rule rejection reported as 422 with `status: false`.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use serde_json::json;

        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "message": errors.summary(), "errors": errors }),
            ),
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": msg, "status": false }),
            ),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, json!({ "message": msg })),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": UNAUTHENTICATED }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            AppError::Forbidden(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "message": msg, "status": false }),
            ),
            AppError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "message": msg }))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "message": msg })),
            AppError::Persistence(msg) => {
                tracing::error!("Persistence failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": USER_CREATE_FAILED, "status": false }),
                )
            }
            AppError::Database(msg) | AppError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": INTERNAL_ERROR }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use rstest::rstest;

    fn valid_register() -> RegisterRequest {
        RegisterRequest {
            name: Some("Juan Pérez".to_string()),
            email: Some("juan@example.com".to_string()),
            password: Some("123456".to_string()),
            role: Some("usuario".to_string()),
        }
    }

    #[test]
    fn test_role_round_trip_strings() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("usuario".parse::<Role>().unwrap(), Role::Usuario);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("Admin".parse::<Role>().is_err());
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Usuario).unwrap(), "\"usuario\"");
    }

    #[test]
    fn test_valid_register_request_passes() {
        assert!(structural_errors(&valid_register()).is_empty());
    }

    #[test]
    fn test_register_accepts_spanish_aliases() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "nombre": "Ana",
            "email": "ana@example.com",
            "password": "secreto",
            "rol": "admin"
        }))
        .unwrap();

        assert_eq!(req.name.as_deref(), Some("Ana"));
        assert_eq!(req.role.as_deref(), Some("admin"));
    }

    #[test]
    fn test_register_missing_fields_reports_each() {
        let errors = structural_errors(&RegisterRequest::default());

        for field in ["name", "email", "password", "role"] {
            assert!(errors.has(field), "expected an error for {}", field);
        }
    }

    #[rstest]
    #[case::long_name("name", RegisterRequest { name: Some("x".repeat(151)), ..valid_register() })]
    #[case::empty_name("name", RegisterRequest { name: Some(String::new()), ..valid_register() })]
    #[case::bad_email("email", RegisterRequest { email: Some("not-an-email".into()), ..valid_register() })]
    #[case::short_password("password", RegisterRequest { password: Some("12345".into()), ..valid_register() })]
    fn test_register_field_rules(#[case] field: &str, #[case] req: RegisterRequest) {
        let errors = structural_errors(&req);
        assert!(errors.has(field), "expected error on {}: {:?}", field, errors);
        assert_eq!(errors.count(), 1);
    }

    #[test]
    fn test_name_of_150_multibyte_chars_is_accepted() {
        let req = RegisterRequest {
            name: Some("é".repeat(150)),
            ..valid_register()
        };
        assert!(structural_errors(&req).is_empty());
    }

    #[test]
    fn test_login_requires_both_fields() {
        let errors = structural_errors(&LoginRequest {
            email: Some("a@b.com".into()),
            password: Some(String::new()),
        });
        assert!(errors.has("password"));
        assert!(!errors.has("email"));
    }

    #[test]
    fn test_update_request_skips_absent_fields() {
        assert!(structural_errors(&UpdateUserRequest::default()).is_empty());
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "   ",
            "email": " ana@example.com ",
            "password": "",
            "role": "\t"
        }))
        .unwrap();

        assert_eq!(req.email.as_deref(), Some("ana@example.com"));
        let errors = structural_errors(&req);
        assert_eq!(errors.get("name"), Some(&[NAME_REQUIRED.to_string()][..]));
        assert_eq!(errors.get("role"), Some(&[ROLE_REQUIRED.to_string()][..]));
        assert!(errors.has("password"));
        assert!(!errors.has("email"));
    }

    #[test]
    fn test_update_request_null_is_not_absent() {
        let absent: UpdateUserRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(absent.field_errors().is_empty());

        let cleared: UpdateUserRequest = serde_json::from_value(serde_json::json!({
            "name": null,
            "email": null,
            "password": null
        }))
        .unwrap();
        let errors = cleared.field_errors();
        assert_eq!(errors.get("name"), Some(&[NAME_REQUIRED.to_string()][..]));
        assert_eq!(errors.get("email"), Some(&[EMAIL_REQUIRED.to_string()][..]));
        assert!(!errors.has("password"));
        assert_eq!(errors.count(), 2);
    }

    #[test]
    fn test_update_request_normalizes_empty_password() {
        let req = UpdateUserRequest {
            password: Some(String::new()),
            ..Default::default()
        }
        .normalized();

        assert!(req.password.is_none());
        assert!(structural_errors(&req).is_empty());
    }

    #[test]
    fn test_field_errors_summary() {
        let mut errors = FieldErrors::new();
        assert_eq!(errors.summary(), "");

        errors.add("role", "bad role");
        assert_eq!(errors.summary(), "bad role");

        errors.add("email", "bad email");
        assert_eq!(errors.summary(), "bad email (y 1 error más)");

        errors.add("email", "long email");
        assert_eq!(errors.summary(), "bad email (y 2 errores más)");
    }

    #[test]
    fn test_field_errors_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());
        assert!(matches!(
            FieldErrors::single("email", EMAIL_TAKEN).into_result(),
            Err(AppError::Validation(_))
        ));
    }

    #[rstest]
    #[case(AppError::Validation(FieldErrors::single("email", EMAIL_TAKEN)), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::InvalidInput(ROLE_REJECTED.into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::Auth(INVALID_CREDENTIALS.into()), StatusCode::UNAUTHORIZED)]
    #[case(AppError::Unauthenticated, StatusCode::UNAUTHORIZED)]
    #[case(AppError::NotFound(USER_NOT_FOUND.into()), StatusCode::NOT_FOUND)]
    #[case(AppError::Forbidden(ONLY_ADMIN_UPDATABLE.into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::Unprocessable(ROLE_REJECTED.into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::Persistence("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AppError::Database("locked".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_error_status_codes(#[case] error: AppError, #[case] expected: StatusCode) {
        assert_eq!(error.into_response().status(), expected);
    }
}
