//! Configuration management for anime-relay
//!
//! Values come from a TOML file and are then overridden by environment
//! variables. A non-empty environment value always wins.

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anime_relay_types::BotMethod;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::env::ReadEnv;
use crate::gateway::Endpoint;

const ENV_NATS_URL: &str = "NATS_URL";
const ENV_NATS_SUBJECT: &str = "NATS_SUBJECT";
const ENV_NATS_ERROR_SUBJECT: &str = "NATS_ERROR_SUBJECT";
const ENV_TELEGRAM_URL: &str = "TELEGRAM_URL";
const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
const ENV_TELEGRAM_TIMEOUT: &str = "TELEGRAM_TIMEOUT_SECS";
const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";
const ENV_PUBLIC_KEY: &str = "PATH_TO_PUBLIC_KEY";
const ENV_PORT: &str = "PORT";
const ENV_DEEP_LINK: &str = "INLINE_DEEP_LINK_TEMPLATE";

const DEFAULT_NATS_URL: &str = "localhost:4222";
const DEFAULT_BOT_BASE_URL: &str = "https://api.telegram.org/bot";
const DEFAULT_PORT: u16 = 8080;

/// Placeholder replaced by the anime id in deep links
pub const DEEP_LINK_PLACEHOLDER: &str = "%d";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting {key} (env {env})")]
    Missing {
        key: &'static str,
        env: &'static str,
    },

    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("deep link template '{0}' must contain %d")]
    Template(String),
}

/// Complete relay configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub nats: NatsSettings,
    pub bot: BotSettings,
    pub webhook: WebhookSettings,
    pub server: ServerSettings,
    pub inline: InlineSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatsSettings {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Subject notifications arrive on
    pub subject: String,
    /// Subject error events are published to; unset disables publishing
    pub error_subject: Option<String>,
}

#[derive(Clone)]
pub struct BotSettings {
    /// Bot API base URL; the token is appended directly
    pub base_url: String,
    pub token: String,
    pub request_timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
}

impl BotSettings {
    /// `{base_url}{token}/{method}`
    pub fn endpoint(&self, method: BotMethod) -> Endpoint {
        Endpoint {
            method,
            url: format!("{}{}{}", self.base_url, self.token, method.path()),
        }
    }
}

impl fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotSettings")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSettings {
    /// Public URL Telegram should push updates to
    pub url: String,
    /// Certificate uploaded alongside the webhook registration
    pub public_key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Port of the health endpoint
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSettings {
    pub deep_link: DeepLinkTemplate,
}

/// URL template for inline result deep links, e.g. `https://example.com/anime/%d`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLinkTemplate(String);

impl DeepLinkTemplate {
    pub fn parse(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        if !template.contains(DEEP_LINK_PLACEHOLDER) {
            return Err(ConfigError::Template(template));
        }
        Ok(Self(template))
    }

    /// Substitute the first placeholder with `anime_id`
    pub fn expand(&self, anime_id: i64) -> String {
        self.0
            .replacen(DEEP_LINK_PLACEHOLDER, &anime_id.to_string(), 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// On-disk layout; every value is optional until env overrides are applied
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    nats: NatsSection,
    bot: BotSection,
    webhook: WebhookSection,
    server: ServerSection,
    inline: InlineSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NatsSection {
    url: Option<String>,
    subject: Option<String>,
    error_subject: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BotSection {
    base_url: Option<String>,
    token: Option<String>,
    request_timeout_secs: Option<u64>,
    accept_invalid_certs: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebhookSection {
    url: Option<String>,
    public_key_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InlineSection {
    deep_link_template: Option<String>,
}

impl Config {
    /// Load from `path` if it exists, otherwise from the environment alone
    pub fn load<E: ReadEnv>(path: &Path, env: &E) -> Result<Self, ConfigError> {
        let file = if path.exists() {
            info!(path = %path.display(), "Loading config file");
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            info!(path = %path.display(), "Config file not found, using environment variables");
            ConfigFile::default()
        };

        Self::resolve(file, env)
    }

    /// Parse TOML content and apply environment overrides
    #[cfg(test)]
    pub fn from_toml_str<E: ReadEnv>(content: &str, env: &E) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Self::resolve(file, env)
    }

    fn resolve<E: ReadEnv>(file: ConfigFile, env: &E) -> Result<Self, ConfigError> {
        let nats_url = override_with(env, ENV_NATS_URL, file.nats.url)
            .unwrap_or_else(|| DEFAULT_NATS_URL.to_string());
        let subject = required(
            env,
            "nats.subject",
            ENV_NATS_SUBJECT,
            file.nats.subject,
        )?;
        let error_subject = override_with(env, ENV_NATS_ERROR_SUBJECT, file.nats.error_subject);

        let base_url = override_with(env, ENV_TELEGRAM_URL, file.bot.base_url)
            .unwrap_or_else(|| DEFAULT_BOT_BASE_URL.to_string());
        let token = required(env, "bot.token", ENV_TELEGRAM_TOKEN, file.bot.token)?;
        let request_timeout = match env_value(env, ENV_TELEGRAM_TIMEOUT) {
            Some(raw) => Some(parse_number::<u64>("bot.request_timeout_secs", raw)?),
            None => file.bot.request_timeout_secs,
        }
        .map(Duration::from_secs);

        let webhook_url = required(env, "webhook.url", ENV_WEBHOOK_URL, file.webhook.url)?;
        let public_key_path = required(
            env,
            "webhook.public_key_path",
            ENV_PUBLIC_KEY,
            file.webhook.public_key_path,
        )?;

        let port = match env_value(env, ENV_PORT) {
            Some(raw) => parse_number::<u16>("server.port", raw)?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        };

        let deep_link = DeepLinkTemplate::parse(required(
            env,
            "inline.deep_link_template",
            ENV_DEEP_LINK,
            file.inline.deep_link_template,
        )?)?;

        Ok(Config {
            nats: NatsSettings {
                servers: split_servers(&nats_url),
                subject,
                error_subject,
            },
            bot: BotSettings {
                base_url,
                token,
                request_timeout,
                accept_invalid_certs: file.bot.accept_invalid_certs,
            },
            webhook: WebhookSettings {
                url: webhook_url,
                public_key_path: PathBuf::from(public_key_path),
            },
            server: ServerSettings { port },
            inline: InlineSettings { deep_link },
        })
    }
}

fn env_value<E: ReadEnv>(env: &E, key: &str) -> Option<String> {
    env.var(key).ok().filter(|v| !v.is_empty())
}

fn override_with<E: ReadEnv>(env: &E, key: &str, file_value: Option<String>) -> Option<String> {
    env_value(env, key).or(file_value)
}

fn required<E: ReadEnv>(
    env: &E,
    key: &'static str,
    env_key: &'static str,
    file_value: Option<String>,
) -> Result<String, ConfigError> {
    override_with(env, env_key, file_value)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { key, env: env_key })
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

fn split_servers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
