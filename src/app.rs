use crate::config::Config;
use crate::provider::{self, GenerationParams, Provider};
use crate::relay::{Relay, DEFAULT_SYSTEM_PROMPT};
use crate::cli;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Fully resolved startup settings: CLI/env first, then config.toml, then defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub provider: String,
    pub model: Option<String>,
    pub params: GenerationParams,
    pub timeout: Duration,
    pub system_prompt: String,
    pub cors_origins: Option<String>,
}

impl Settings {
    pub fn resolve(args: &cli::Args, cfg: Option<&Config>) -> Self {
        let defaults = GenerationParams::default();
        Self {
            host: args
                .host
                .clone()
                .or_else(|| cfg.and_then(|c| c.host.clone()))
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: args.port.or_else(|| cfg.and_then(|c| c.port)).unwrap_or(5003),
            provider: args
                .provider
                .clone()
                .or_else(|| cfg.and_then(|c| c.provider.clone()))
                .unwrap_or_else(|| "deepseek".to_string()),
            model: args.model.clone().or_else(|| cfg.and_then(|c| c.model.clone())),
            params: GenerationParams {
                max_tokens: cfg.and_then(|c| c.max_tokens).unwrap_or(defaults.max_tokens),
                temperature: cfg.and_then(|c| c.temperature).unwrap_or(defaults.temperature),
            },
            timeout: Duration::from_secs(cfg.and_then(|c| c.timeout_secs).unwrap_or(60)),
            system_prompt: cfg
                .and_then(|c| c.system_prompt.clone())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            cors_origins: cfg.and_then(|c| c.cors_origins.clone()),
        }
    }
}

pub fn build_http_client(settings: &Settings) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(settings.timeout)
        .build()
        .context("failed to build HTTP client")
}

/// Env var first, then the config file. An empty value counts as missing.
fn api_key(env_var: &str, from_config: Option<&String>) -> Option<String> {
    let present = |k: &String| !k.trim().is_empty();
    std::env::var(env_var)
        .ok()
        .filter(present)
        .or_else(|| from_config.cloned().filter(present))
}

pub fn build_provider(
    http: &reqwest::Client,
    cfg: Option<&Config>,
    settings: &Settings,
) -> anyhow::Result<Arc<dyn Provider>> {
    match settings.provider.as_str() {
        "deepseek" => {
            #[cfg(feature = "deepseek")]
            {
                let section = cfg.map(|c| &c.deepseek);
                let Some(key) = api_key("DEEPSEEK_API_KEY", section.and_then(|s| s.api_key.as_ref()))
                else {
                    anyhow::bail!("No DeepSeek API key found. Set DEEPSEEK_API_KEY or config.toml deepseek.api_key");
                };
                let base = section
                    .and_then(|s| s.api_base.clone())
                    .unwrap_or_else(|| provider::deepseek::DEFAULT_API_BASE.to_string());
                let model = settings
                    .model
                    .clone()
                    .unwrap_or_else(|| provider::deepseek::DEFAULT_MODEL.to_string());

                let p = provider::deepseek::DeepSeekProvider::new(http.clone(), key, &base, model, settings.params)?;
                Ok(Arc::new(p))
            }
            #[cfg(not(feature = "deepseek"))]
            {
                let _ = http;
                let _ = cfg;
                anyhow::bail!("deepseek provider is not enabled in this build")
            }
        }
        "google" => {
            #[cfg(feature = "google")]
            {
                let section = cfg.map(|c| &c.google);
                let Some(key) = api_key("GEMINI_API_KEY", section.and_then(|s| s.api_key.as_ref()))
                else {
                    anyhow::bail!("No Gemini API key found. Set GEMINI_API_KEY or config.toml google.api_key");
                };
                let base = section
                    .and_then(|s| s.api_base.clone())
                    .unwrap_or_else(|| provider::google::DEFAULT_API_BASE.to_string());
                let model = settings
                    .model
                    .clone()
                    .unwrap_or_else(|| provider::google::DEFAULT_MODEL.to_string());

                let p = provider::google::GoogleProvider::new(http.clone(), key, &base, model, settings.params)?;
                Ok(Arc::new(p))
            }
            #[cfg(not(feature = "google"))]
            {
                let _ = http;
                let _ = cfg;
                anyhow::bail!("google provider is not enabled in this build")
            }
        }
        "stub" => Ok(Arc::new(provider::stub::StubProvider::new())),
        other => anyhow::bail!("unknown provider: {other}"),
    }
}

pub fn build_relay(http: &reqwest::Client, cfg: Option<&Config>, settings: &Settings) -> anyhow::Result<Relay> {
    let provider = build_provider(http, cfg, settings)?;
    Ok(Relay::new(provider, settings.system_prompt.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use clap::Parser;

    fn args(extra: &[&str]) -> cli::Args {
        let mut argv = vec!["chat-relay"];
        argv.extend_from_slice(extra);
        cli::Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_win_over_config_file() {
        let cfg = Config {
            port: Some(9000),
            provider: Some("google".into()),
            max_tokens: Some(64),
            ..Config::default()
        };
        let s = Settings::resolve(&args(&["--port", "7000", "--provider", "stub"]), Some(&cfg));
        assert_eq!(s.port, 7000);
        assert_eq!(s.provider, "stub");
        assert_eq!(s.params.max_tokens, 64);
        assert_eq!(s.params.temperature, GenerationParams::default().temperature);
    }

    #[test]
    fn unknown_provider_fails_startup() {
        let s = Settings::resolve(&args(&["--provider", "nope"]), None);
        let err = build_provider(&reqwest::Client::new(), None, &s).err().unwrap();
        assert!(err.to_string().contains("unknown provider: nope"));
    }

    #[test]
    fn stub_provider_needs_no_key() {
        let s = Settings::resolve(&args(&["--provider", "stub"]), None);
        let relay = build_relay(&reqwest::Client::new(), None, &s).unwrap();
        assert_eq!(relay.provider_name(), "stub");
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_key_from_config_file() {
        let cfg = Config {
            google: ProviderConfig {
                api_key: Some("g-key".into()),
                api_base: None,
            },
            ..Config::default()
        };
        let s = Settings::resolve(&args(&["--provider", "google"]), Some(&cfg));
        let p = build_provider(&reqwest::Client::new(), Some(&cfg), &s).unwrap();
        assert_eq!(p.name(), "google");
    }

    #[cfg(feature = "deepseek")]
    #[test]
    fn invalid_base_url_fails_startup() {
        let cfg = Config {
            deepseek: ProviderConfig {
                api_key: Some("sk".into()),
                api_base: Some("not a url".into()),
            },
            ..Config::default()
        };
        let s = Settings::resolve(&args(&["--provider", "deepseek"]), Some(&cfg));
        let err = build_provider(&reqwest::Client::new(), Some(&cfg), &s).err().unwrap();
        assert!(err.to_string().contains("invalid DeepSeek API base URL"));
    }
}
