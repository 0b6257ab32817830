use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use usuarios::{
    api::routes::app,
    cli::{
        init::{self, InitConfig, InitResult},
        output::{Mark, Output},
        Cli, Commands,
    },
    AppState, ConfigManager, UsuariosConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = Output::new(!cli.no_color);

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    host,
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => anyhow::bail!("init failed: {}", e),
            }
        }
        Some(Commands::Config { validate }) => show_config(&cli.config, validate, &output),
        Some(Commands::Serve) | None => serve(&cli.config, cli.verbose).await,
    }
}

fn show_config(path: &std::path::Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    let config = match UsuariosConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            output.status(Mark::Failed, &e.to_string());
            anyhow::bail!("invalid configuration at {}", path.display());
        }
    };

    if validate {
        output.status(Mark::Done, &format!("{} is valid", path.display()));
        return Ok(());
    }

    let expiry = match config.auth.token_expiry_minutes {
        Some(minutes) => format!("{} min", minutes),
        None => "never".to_string(),
    };

    output.section(&format!("Configuration ({})", path.display()));
    output.field("server", config.bind_address());
    output.field("log", format!("{} ({})", config.server.log_level, config.server.log_format));
    output.field("token_name", &config.auth.token_name);
    output.field("token_expiry", expiry);
    output.field("database", &config.database.url);
    Ok(())
}

fn init_tracing(config: &UsuariosConfig, verbose: bool) {
    let default_filter = if verbose {
        "debug".to_string()
    } else {
        format!("{},tower_http=debug", config.server.log_level)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if config.server.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn serve(config_path: &std::path::Path, verbose: bool) -> anyhow::Result<()> {
    let config_manager = Arc::new(
        ConfigManager::new(config_path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {}", config_path.display(), e))?,
    );
    let config = config_manager.config();

    init_tracing(&config, verbose);
    info!("Starting usuarios-api v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config_manager.start_watching() {
        warn!("Configuration hot-reload disabled: {}", e);
    }

    let state = AppState::new(config_manager.clone())
        .await
        .context("failed to open database")?;
    info!("Database ready ({})", config.database.url);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    config_manager.stop_watching();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received CTRL-C, shutting down gracefully...");
}
