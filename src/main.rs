use anyhow::Context;
use clap::Parser;
use ewcl::api::{ApiServer, AppState};
use ewcl::cli::{self, Cli, Commands};
use ewcl::config::{AppConfig, LoggingConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    match &cli.command {
        Some(Commands::Predict { input }) => {
            init_logging_simple();
            cli::run_predict(&config, input)?;
        }
        Some(Commands::Features { input }) => {
            init_logging_simple();
            cli::run_features(input)?;
        }
        Some(Commands::Analyze { path, scoring }) => {
            init_logging_simple();
            cli::run_analyze(path, (*scoring).into())?;
        }
        Some(Commands::Serve) | None => {
            init_logging(&config.logging);
            run_server(config).await?;
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Config error: {}", e);
        }
        anyhow::bail!("invalid configuration ({} problem(s))", errors.len());
    }

    let model_path = config.model.resolved_path();
    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(path = %model_path.display(), "Refusing to start: {}", e);
            return Err(e).context("failed to load collapse model");
        }
    };

    info!(
        model = state.predictor.model_kind(),
        input_dim = state.predictor.input_dim(),
        features = ?state.predictor.selector().features(),
        upload_dir = %state.upload_dir.display(),
        "Collapse predictor ready"
    );

    ApiServer::new(state, config).run(shutdown_signal()).await?;
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},ewcl=debug,tower_http=info", logging.level))
    });

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

fn init_logging_simple() {
    // Minimal logging for CLI commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => { stream.recv().await; }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
