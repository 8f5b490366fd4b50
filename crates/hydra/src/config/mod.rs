use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::pipeline::{DEFAULT_TOKEN_TTL_DAYS, MAX_TOKEN_TTL_DAYS};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let token_ttl_days = match env::var("APP_TOKEN_TTL_DAYS") {
            Ok(raw) => match raw.trim().parse::<i64>() {
                Ok(days) if (1..=MAX_TOKEN_TTL_DAYS).contains(&days) => days,
                _ => return Err(ConfigError::InvalidTokenTtl { value: raw }),
            },
            Err(_) => DEFAULT_TOKEN_TTL_DAYS,
        };

        let catalog_path = env::var("APP_CATALOG_PATH")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pipeline: PipelineSettings {
                token_ttl_days,
                catalog_path,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the recruitment pipeline policy.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Validity window of a candidate access token.
    pub token_ttl_days: i64,
    /// JSON catalog replacing the built-in cliente/cargo/oleada tables.
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTokenTtl { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTokenTtl { value } => write!(
                f,
                "APP_TOKEN_TTL_DAYS must be between 1 and {MAX_TOKEN_TTL_DAYS} days (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidTokenTtl { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_TOKEN_TTL_DAYS");
        env::remove_var("APP_CATALOG_PATH");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.pipeline.token_ttl_days, 30);
        assert!(config.pipeline.catalog_path.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_non_positive_token_ttl() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_TOKEN_TTL_DAYS", "0");
        match AppConfig::load() {
            Err(ConfigError::InvalidTokenTtl { value }) => assert_eq!(value, "0"),
            other => panic!("expected invalid ttl, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_token_ttl_beyond_ten_years() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_TOKEN_TTL_DAYS", "100000000");
        match AppConfig::load() {
            Err(ConfigError::InvalidTokenTtl { value }) => assert_eq!(value, "100000000"),
            other => panic!("expected invalid ttl, got {other:?}"),
        }

        env::set_var("APP_TOKEN_TTL_DAYS", "3650");
        let config = AppConfig::load().expect("upper bound accepted");
        assert_eq!(config.pipeline.token_ttl_days, 3650);
        reset_env();
    }

    #[test]
    fn reads_catalog_path_and_ttl_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_TOKEN_TTL_DAYS", "7");
        env::set_var("APP_CATALOG_PATH", "/etc/hydra/catalog.json");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.pipeline.token_ttl_days, 7);
        assert_eq!(
            config.pipeline.catalog_path,
            Some(PathBuf::from("/etc/hydra/catalog.json"))
        );
        reset_env();
    }
}
