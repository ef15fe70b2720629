//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Email delivery configuration.
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// Comment-thread assembly configuration.
    #[serde(default)]
    pub thread: ThreadConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance (used in email links).
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Email delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Provider name: "smtp", "sendgrid", or "mailgun".
    pub provider: String,
    /// From address.
    pub from_address: String,
    /// From display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Provider API key (SendGrid/Mailgun).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Mailgun sending domain.
    #[serde(default)]
    pub domain: Option<String>,
    /// SMTP host.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP port.
    #[serde(default)]
    pub smtp_port: Option<u16>,
}

/// Thread assembly strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadStrategy {
    /// Fetch all comments in one query, assemble the full reply forest.
    #[default]
    SinglePass,
    /// Fetch roots first, then each root's direct replies (depth capped at 1).
    TwoPass,
}

/// Comment-thread assembly configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadConfig {
    /// Which retrieval strategy to use when listing a content item's comments.
    #[serde(default)]
    pub strategy: ThreadStrategy,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_from_name() -> String {
    "Lyceum".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `LYCEUM_ENV`)
    /// 3. Environment variables with `LYCEUM_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("LYCEUM_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LYCEUM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("LYCEUM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_strategy_default() {
        assert_eq!(ThreadStrategy::default(), ThreadStrategy::SinglePass);
    }

    #[test]
    fn test_thread_strategy_deserialize() {
        let strategy: ThreadStrategy = serde_json::from_str("\"two-pass\"").unwrap();
        assert_eq!(strategy, ThreadStrategy::TwoPass);
    }
}
