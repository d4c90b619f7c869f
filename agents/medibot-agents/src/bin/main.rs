//! MediBot entry point
//!
//! ```bash
//! # Serve the agents over HTTP
//! medibot serve --port 8000 --config medibot.yaml
//!
//! # Classify a reading locally
//! medibot classify --preset early_warning --vitals '{"pulse": 130, "temp": 38.2}'
//! medibot classify --preset graded_risk --vitals @reading.json
//!
//! # Poll the configured vitals sources once
//! medibot poll --config medibot.yaml
//! ```

use clap::{Parser, Subcommand};
use medibot_agents::agents::spawn_polling;
use medibot_agents::cli::{self, ExitCode, OutputFormat};
use medibot_agents::handler::{create_router, AppState};
use medibot_agents::poller::{into_batch, SourcePoller};
use medibot_agents::ServiceConfig;
use medibot_core::{RulePreset, VitalsClassifier};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medibot")]
#[command(about = "MediBot - vital-sign triage agents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "MEDIBOT_HOST")]
        host: Option<String>,

        /// Configuration file (JSON, YAML or TOML)
        #[arg(short, long, env = "MEDIBOT_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Classify one reading with a rule preset
    Classify {
        /// Rule preset (early_warning or graded_risk)
        #[arg(short, long, default_value = "early_warning")]
        preset: RulePreset,

        /// Vitals as inline JSON, or @path to a JSON/YAML file
        #[arg(short, long)]
        vitals: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Configuration file supplying custom thresholds
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Poll every configured vitals source once
    Poll {
        /// Configuration file listing the sources
        #[arg(short, long, env = "MEDIBOT_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host, config } => {
            let mut config = ServiceConfig::load(config.as_deref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
            let poll_interval = config.ingest.poll_interval_secs;
            let state = Arc::new(AppState::from_config(config)?);

            let poll_task = poll_interval.map(|secs| {
                tracing::info!(interval_secs = secs, "Scheduled source polling enabled");
                spawn_polling(Arc::clone(&state.ingest), Duration::from_secs(secs))
            });

            let router = create_router(state);

            tracing::info!(%addr, "Starting MediBot agents");

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await?;

            if let Some(task) = poll_task {
                task.abort();
            }
        }

        Commands::Classify {
            preset,
            vitals,
            format,
            config,
        } => {
            let thresholds = match config {
                Some(path) => ServiceConfig::from_file(path)?.thresholds,
                None => Default::default(),
            };

            let reading = match cli::load_vitals(&vitals) {
                Ok(reading) => reading,
                Err(e) => {
                    eprintln!("Invalid vitals input: {}", e);
                    std::process::exit(ExitCode::InvalidInput.into());
                }
            };

            let assessment = VitalsClassifier::from_preset(preset, &thresholds).classify(&reading);
            println!("{}", cli::render(&assessment, format)?);

            let code = ExitCode::from_status(assessment.status);
            if code != ExitCode::Success {
                std::process::exit(code.into());
            }
        }

        Commands::Poll { config } => {
            let config = ServiceConfig::load(config.as_deref())?;
            let poller = SourcePoller::new(config.ingest.sources.clone())
                .with_timeout(config.ingest.timeout());

            if poller.is_empty() {
                tracing::warn!("No vitals sources configured");
            }

            let readings = poller.poll().await;
            for reading in &readings {
                if let Err(e) = &reading.outcome {
                    tracing::warn!(source = %reading.source, error = %e, "Vitals source poll failed");
                }
            }

            println!("{}", serde_json::to_string_pretty(&into_batch(&readings))?);
        }
    }

    Ok(())
}
