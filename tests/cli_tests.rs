//! CLI Integration Tests
//!
//! Argument parsing is checked through `Cli::try_parse_from`; the init and
//! config commands are run against the built binary in a temp directory.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;
use usuarios::cli::{Cli, Commands};

/// Helper to run usuarios-server with arguments
fn run_server(args: &[&str], working_dir: &std::path::Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_usuarios-server"))
        .args(args)
        .current_dir(working_dir)
        .output()
        .expect("Failed to execute command")
}

// =============================================================================
// Argument Parsing
// =============================================================================

#[test]
fn test_defaults_to_serve() {
    let cli = Cli::try_parse_from(["usuarios-server"]).unwrap();

    assert_eq!(cli.config, PathBuf::from("usuarios.toml"));
    assert!(!cli.verbose);
    assert!(!cli.no_color);
    assert!(cli.command.is_none());
}

#[test]
fn test_global_flags() {
    let cli = Cli::try_parse_from([
        "usuarios-server",
        "serve",
        "--config",
        "custom.toml",
        "--verbose",
        "--no-color",
    ])
    .unwrap();

    assert_eq!(cli.config, PathBuf::from("custom.toml"));
    assert!(cli.verbose);
    assert!(cli.no_color);
    assert_eq!(cli.command, Some(Commands::Serve));
}

#[test]
fn test_init_arguments() {
    let cli = Cli::try_parse_from(["usuarios-server", "init", "proj", "--force", "--port", "9000"])
        .unwrap();

    assert_eq!(
        cli.command,
        Some(Commands::Init {
            path: PathBuf::from("proj"),
            force: true,
            host: "127.0.0.1".to_string(),
            port: 9000,
        })
    );
}

#[test]
fn test_config_validate_flag() {
    let cli = Cli::try_parse_from(["usuarios-server", "config", "--validate"]).unwrap();
    assert_eq!(cli.command, Some(Commands::Config { validate: true }));
}

#[test]
fn test_unknown_subcommand_fails() {
    assert!(Cli::try_parse_from(["usuarios-server", "migrate"]).is_err());
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn test_init_then_validate() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let init = run_server(&["--no-color", "init"], temp_dir.path());
    assert!(init.status.success(), "init failed: {:?}", init);

    let content = fs::read_to_string(temp_dir.path().join("usuarios.toml")).unwrap();
    assert!(content.contains("[server]"));
    assert!(content.contains("[auth]"));
    assert!(content.contains("[database]"));
    assert!(temp_dir.path().join(".env.example").exists());

    let validate = run_server(&["--no-color", "config", "--validate"], temp_dir.path());
    assert!(validate.status.success(), "validate failed: {:?}", validate);
    assert!(String::from_utf8_lossy(&validate.stdout).contains("is valid"));
}

#[test]
fn test_config_validate_rejects_bad_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("usuarios.toml"),
        "[server]\nlog_format = \"xml\"\n",
    )
    .unwrap();

    let output = run_server(&["--no-color", "config", "--validate"], temp_dir.path());
    assert!(!output.status.success());
}

#[test]
fn test_config_missing_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = run_server(&["--no-color", "config"], temp_dir.path());
    assert!(!output.status.success());
}
