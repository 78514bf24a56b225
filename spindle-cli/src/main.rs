//! Spindle CLI

use anyhow::Result;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use http::Method;
use spindle_config::{load, Config, LoggingConfig};
use spindle_convert::{AnyResult, ConvertingHandler, Observable};
use spindle_core::Error;
use spindle_reactive::ServerHttpRequest;
use spindle_runtime::{configure, SignalHandler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spindle")]
#[command(about = "Spindle reactive web server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo handler
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "spindle.yaml")]
        config: PathBuf,

        /// Override the configured port
        #[arg(short, long, env = "SPINDLE_PORT")]
        port: Option<u16>,

        /// Override the configured log level (trace, debug, info, warn, error)
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "spindle.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            port,
            log_level,
        } => {
            let (mut settings, loaded) = load_or_default(&config)?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(level) = log_level {
                settings.observability.logging.level = level;
            }

            init_tracing(&settings.observability.logging)?;

            tracing::info!("Starting Spindle");
            if loaded {
                tracing::info!("Config file: {}", config.display());
            } else {
                tracing::warn!(
                    path = %config.display(),
                    "Config file not found, using defaults"
                );
            }

            let factory = configure(&settings);
            let mut server = factory.get_web_server(Arc::new(demo_handler()))?;

            let shutdown_signal = server.shutdown_signal();
            let mut shutdown_rx = shutdown_signal.subscribe();
            tokio::spawn(async move {
                let handler = SignalHandler::new(shutdown_signal);
                handler.run().await;
            });

            server.start().await?;
            tracing::info!(port = server.port(), secure = server.is_secure(), "Serving");

            let _ = shutdown_rx.recv().await;
            server.stop().await?;

            tracing::info!("Server stopped");
            Ok(())
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            tracing::info!("Validating configuration: {}", config.display());

            match load(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Listen: {}", cfg.server.socket_addr());
                    tracing::info!("  TLS: {}", cfg.server.tls().is_some());
                    tracing::info!("  Tracing: {}", cfg.observability.tracing.enabled);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Spindle");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

fn load_or_default(path: &Path) -> Result<(Config, bool)> {
    if path.exists() {
        Ok((load(path)?, true))
    } else {
        Ok((Config::default(), false))
    }
}

/// `GET`/`HEAD` describe the request as JSON; other methods echo the body
fn demo_handler() -> ConvertingHandler {
    ConvertingHandler::new(|request: ServerHttpRequest| async move {
        if *request.method() == Method::GET || *request.method() == Method::HEAD {
            let cookies: Vec<String> = request
                .cookies()
                .values()
                .map(|cookie| cookie.name().to_string())
                .collect();
            let info = serde_json::json!({
                "id": request.id(),
                "method": request.method_value(),
                "path": request.path(),
                "query": request.query_params(),
                "cookies": cookies,
                "secure": request.tls_info().is_some(),
                "remote_addr": request.remote_addr().map(|addr| addr.to_string()),
            });
            return Ok::<AnyResult, Error>(Box::new(Observable::just(info)));
        }

        let chunks: Vec<Bytes> = request.body().try_collect().await?;
        Ok(Box::new(Bytes::from(chunks.concat())) as AnyResult)
    })
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = match logging.level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(filter.into())
        .add_directive("hyper=warn".parse()?);

    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true),
            )
            .with(env_filter)
            .init();
    }

    Ok(())
}
