use clap::Parser;
use std::path::PathBuf;

/// HTTP relay between a chat UI and a hosted LLM
#[derive(Debug, Parser)]
#[command(name = "chat-relay")]
#[command(version)]
#[command(about = "HTTP relay between a chat UI and a hosted LLM", long_about = None)]
pub struct Args {
    /// Address to bind (default: config/host or 0.0.0.0)
    #[arg(long = "host", env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on (default: config/port or 5003)
    #[arg(short = 'p', long = "port", env = "PORT")]
    pub port: Option<u16>,

    /// Provider: deepseek, google or stub (default: config/provider or "deepseek")
    #[arg(long = "provider", env = "RELAY_PROVIDER")]
    pub provider: Option<String>,

    /// Model name (default: provider-specific)
    #[arg(short = 'm', long = "model", env = "RELAY_MODEL")]
    pub model: Option<String>,

    /// Path to config.toml (default: under the chat-relay config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}
