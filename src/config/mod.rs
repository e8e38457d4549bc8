use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub upstream: UpstreamConfig,
    pub telemetry: TelemetryConfig,
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

        let scholarship_base_url = env::var("SCHOLARSHIP_API_URL")
            .unwrap_or_else(|_| "https://scholarship-finder2-seven.vercel.app".to_string());
        let lead_base_url =
            env::var("LEAD_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
        let timeout_secs = env::var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "20".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            upstream: UpstreamConfig {
                scholarship_base_url,
                lead_base_url,
                request_timeout: Duration::from_secs(timeout_secs),
            },
            telemetry: TelemetryConfig { log_level },
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

/// Base URLs and timeout for the two consumed endpoints.
///
/// The upstream paths themselves are fixed (`/api/calculate-scholarships`,
/// `/api/submit-lead`); only the hosts move between environments.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub scholarship_base_url: String,
    pub lead_base_url: String,
    pub request_timeout: Duration,
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")]
    InvalidTimeout,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
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
        env::remove_var("SCHOLARSHIP_API_URL");
        env::remove_var("LEAD_API_URL");
        env::remove_var("UPSTREAM_TIMEOUT_SECS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.upstream.lead_base_url, "http://localhost:5000");
        assert_eq!(
            config.upstream.scholarship_base_url,
            "https://scholarship-finder2-seven.vercel.app"
        );
        assert_eq!(config.upstream.request_timeout, Duration::from_secs(20));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn load_honors_upstream_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCHOLARSHIP_API_URL", "http://calc.internal:8080");
        env::set_var("LEAD_API_URL", "http://leads.internal:8081");
        env::set_var("UPSTREAM_TIMEOUT_SECS", "30");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.upstream.scholarship_base_url,
            "http://calc.internal:8080"
        );
        assert_eq!(config.upstream.lead_base_url, "http://leads.internal:8081");
        assert_eq!(config.upstream.request_timeout, Duration::from_secs(30));
        reset_env();
    }

    #[test]
    fn load_rejects_malformed_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("UPSTREAM_TIMEOUT_SECS", "soon");
        match AppConfig::load() {
            Err(ConfigError::InvalidTimeout) => {}
            other => panic!("expected invalid timeout, got {other:?}"),
        }
        reset_env();
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
}
