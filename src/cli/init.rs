//! Init command implementation
//!
//! Scaffolds `usuarios.toml`, `.env.example` and the `data/` directory.

use super::output::{Mark, Output};
use crate::utils::toml_config::DEFAULT_CONFIG_FILE;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (usuarios.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.section(&format!("usuarios-api v{} init", env!("CARGO_PKG_VERSION")));

    let base_path = &config.path;

    let config_path = base_path.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() && !config.force {
        output.status(
            Mark::Warning,
            &format!("{} already exists, use --force to overwrite", DEFAULT_CONFIG_FILE),
        );
        return InitResult::AlreadyExists;
    }

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.status(Mark::Skipped, "data/ already exists");
    } else {
        if let Err(e) = fs::create_dir_all(&data_dir) {
            output.status(Mark::Failed, &format!("data/: {}", e));
            return InitResult::Error(e.to_string());
        }
        output.status(Mark::Done, "data/");
    }

    let files = [
        (config_path, generate_usuarios_toml(&config)),
        (base_path.join(".env.example"), generate_env_example()),
    ];
    for (path, content) in &files {
        if let Err(e) = write_file(path, content, config.force) {
            output.status(Mark::Failed, &format!("{}: {}", path.display(), e));
            return InitResult::Error(e.to_string());
        }
        output.status(Mark::Done, &path.display().to_string());
    }

    output.section("Next steps");
    output.shell("usuarios-server");
    output.shell(&format!(
        "curl -X POST http://{}:{}/api/register -H 'Content-Type: application/json' \\\n         -d '{{\"name\":\"Admin\",\"email\":\"admin@example.com\",\"password\":\"secreto\",\"role\":\"admin\"}}'",
        config.host, config.port
    ));

    InitResult::Success
}

/// Write a file unless it already exists (or `force` is set)
fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_usuarios_toml(config: &InitConfig) -> String {
    format!(
        r#"# usuarios-api configuration

[server]
host = "{host}"
port = {port}
log_level = "info"
# "pretty" for development, "json" for log shippers
log_format = "pretty"

[auth]
# Name recorded on issued tokens
token_name = "api-token"
# Optional prefix for plaintext tokens, e.g. "usr_"
token_prefix = ""
# Uncomment to make tokens expire
# token_expiry_minutes = 1440

[database]
# Local SQLite file; use ":memory:" for an ephemeral database
url = "./data/usuarios.db"
# Remote Turso (requires the `turso` feature); values are env var names
# turso_url_env = "TURSO_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"
"#,
        host = config.host,
        port = config.port
    )
}

fn generate_env_example() -> String {
    r#"# Copy to .env and adjust

# Log filter (overrides server.log_level)
RUST_LOG=info,usuarios=debug,tower_http=debug

# Remote Turso database (only with the `turso` feature and the
# turso_*_env keys set in usuarios.toml)
# TURSO_URL=libsql://your-db.turso.io
# TURSO_AUTH_TOKEN=
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::UsuariosConfig;
    use tempfile::TempDir;

    fn create_test_config(temp_dir: &TempDir, force: bool) -> InitConfig {
        InitConfig {
            path: temp_dir.path().to_path_buf(),
            force,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }

    #[test]
    fn test_generated_toml_is_valid_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let content = generate_usuarios_toml(&create_test_config(&temp_dir, false));

        let config = UsuariosConfig::from_toml(&content).expect("generated config should parse");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "./data/usuarios.db");
    }

    #[test]
    fn test_write_file_skips_existing_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("file.txt");
        fs::write(&path, "original").unwrap();

        write_file(&path, "new", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");

        write_file(&path, "new", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_run_creates_all_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let result = run(create_test_config(&temp_dir, false), &Output::new(false));

        assert_eq!(result, InitResult::Success);
        assert!(temp_dir.path().join("usuarios.toml").exists());
        assert!(temp_dir.path().join(".env.example").exists());
        assert!(temp_dir.path().join("data").is_dir());
    }

    #[test]
    fn test_run_already_exists_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("usuarios.toml"), "existing").unwrap();

        let result = run(create_test_config(&temp_dir, false), &Output::new(false));

        assert_eq!(result, InitResult::AlreadyExists);
        let content = fs::read_to_string(temp_dir.path().join("usuarios.toml")).unwrap();
        assert_eq!(content, "existing");
    }

    #[test]
    fn test_run_force_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("usuarios.toml"), "existing").unwrap();

        let result = run(create_test_config(&temp_dir, true), &Output::new(false));

        assert_eq!(result, InitResult::Success);
        let content = fs::read_to_string(temp_dir.path().join("usuarios.toml")).unwrap();
        assert!(content.contains("[server]"));
        assert!(!content.contains("existing"));
    }
}
