use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// One year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// How long a login stays valid, on both the server token and the client session
    pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_file: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            session_file: "~/.mentor-connect/session.json".to_string(),
        }
    }
}

impl Config {
    /// Load `path` (any extension the config crate knows), then apply
    /// `MENTOR_CONNECT__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MENTOR_CONNECT").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would make every login expire at once or overflow
    pub fn validate(&self) -> Result<()> {
        let hours = self.auth.session_ttl_hours;
        ensure!(
            (1..=MAX_SESSION_TTL_HOURS).contains(&hours),
            "auth.session_ttl_hours must be between 1 and {}, got {}",
            MAX_SESSION_TTL_HOURS,
            hours
        );
        Ok(())
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.auth.session_ttl_hours)
    }

    /// Session file path with `~` and environment variables expanded
    pub fn session_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.client.session_file)
            .with_context(|| format!("Failed to expand {}", self.client.session_file))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}
