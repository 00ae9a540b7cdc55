mod app;
mod cli;
mod config;
mod error;
mod paths;
mod provider;
mod relay;
mod server;

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();

    let cfg = match args.config.clone().or_else(paths::default_config_path) {
        Some(path) => {
            let cfg = config::Config::load_optional(&path)?;
            tracing::debug!(config_path = ?path, ?cfg, "resolved config");
            cfg
        }
        None => {
            tracing::debug!("no config directory; using flags, env and defaults");
            None
        }
    };

    let settings = app::Settings::resolve(&args, cfg.as_ref());
    let http = app::build_http_client(&settings)?;
    let relay = app::build_relay(&http, cfg.as_ref(), &settings)
        .context("failed to configure provider")?;
    tracing::info!(
        provider = relay.provider_name(),
        max_tokens = settings.params.max_tokens,
        temperature = settings.params.temperature,
        "chat-relay starting"
    );

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("invalid listen address: {}:{}", settings.host, settings.port))?;

    let app = server::router(Arc::new(relay), settings.cors_origins.as_deref());
    server::serve(app, addr).await
}
