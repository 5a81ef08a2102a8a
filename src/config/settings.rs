//! Application settings loaded from environment variables.

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use super::constants::{
    APP_ENV_DEVELOPMENT, DEFAULT_DATABASE_URL, DEFAULT_FRONTEND_URL, DEFAULT_JWT_EXPIRATION_HOURS,
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REDIS_URL, DEFAULT_REFRESH_EXPIRATION_DAYS,
    DEFAULT_RESET_EXPIRATION_MINUTES, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_UPLOAD_DIR, EMAIL_QUEUE_POSTGRES, EMAIL_RATE_LIMIT_MAX,
    EMAIL_RATE_LIMIT_WINDOW_SECONDS, MIN_JWT_SECRET_LENGTH,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    jwt_refresh_secret: String,
    pub jwt_expiration_hours: i64,
    pub refresh_expiration_days: i64,
    pub reset_expiration_minutes: i64,
    pub server_host: String,
    pub server_port: u16,
    pub app_env: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub frontend_url: String,
    pub email_queue: bool,
    pub email_rate_limit_max: u64,
    pub email_rate_limit_window_seconds: u64,
    /// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed.
    pub trusted_proxies: Vec<IpAddr>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_refresh_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("refresh_expiration_days", &self.refresh_expiration_days)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("app_env", &self.app_env)
            .field("upload_dir", &self.upload_dir)
            .field("email_queue", &self.email_queue)
            .field("trusted_proxies", &self.trusted_proxies)
            .finish()
    }
}

impl Config {
    /// Configuration with the given signing secrets and defaults for everything else.
    pub fn new(jwt_secret: impl Into<String>, jwt_refresh_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_refresh_secret: jwt_refresh_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            refresh_expiration_days: DEFAULT_REFRESH_EXPIRATION_DAYS,
            reset_expiration_minutes: DEFAULT_RESET_EXPIRATION_MINUTES,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            app_env: "production".to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            email_queue: false,
            email_rate_limit_max: EMAIL_RATE_LIMIT_MAX,
            email_rate_limit_window_seconds: EMAIL_RATE_LIMIT_WINDOW_SECONDS,
            trusted_proxies: Vec::new(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a signing secret is missing in a release build or is too short.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = secret_from_env("JWT_SECRET", "dev-secret-key-minimum-32-chars!!");
        let jwt_refresh_secret =
            secret_from_env("JWT_REFRESH_SECRET", "dev-refresh-key-minimum-32-chars!");

        let mut config = Self::new(jwt_secret, jwt_refresh_secret);

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(url) = env::var("REDIS_URL") {
            config.redis_url = url;
        }
        config.jwt_expiration_hours = parsed("JWT_EXPIRATION_HOURS", config.jwt_expiration_hours);
        config.refresh_expiration_days =
            parsed("JWT_REFRESH_EXPIRATION_DAYS", config.refresh_expiration_days);
        config.reset_expiration_minutes = parsed(
            "PASSWORD_RESET_EXPIRATION_MINUTES",
            config.reset_expiration_minutes,
        );
        if let Ok(host) = env::var("SERVER_HOST") {
            config.server_host = host;
        }
        config.server_port = parsed("SERVER_PORT", config.server_port);
        if let Ok(app_env) = env::var("APP_ENV") {
            config.app_env = app_env;
        }
        if let Ok(dir) = env::var("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        config.max_upload_bytes = parsed("MAX_UPLOAD_BYTES", config.max_upload_bytes);
        if let Ok(url) = env::var("FRONTEND_URL") {
            config.frontend_url = url.trim_end_matches('/').to_string();
        }
        config.email_queue = env::var("EMAIL_QUEUE")
            .map(|v| v.eq_ignore_ascii_case(EMAIL_QUEUE_POSTGRES))
            .unwrap_or(false);
        config.email_rate_limit_max = parsed("EMAIL_RATE_LIMIT_MAX", config.email_rate_limit_max);
        config.email_rate_limit_window_seconds = parsed(
            "EMAIL_RATE_LIMIT_WINDOW_SECONDS",
            config.email_rate_limit_window_seconds,
        );
        if let Ok(raw) = env::var("TRUSTED_PROXIES") {
            config.trusted_proxies = parse_ip_list(&raw);
        }

        config
    }

    /// Secret bytes for access token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Secret bytes for refresh token signing/verification.
    pub fn refresh_secret_bytes(&self) -> &[u8] {
        self.jwt_refresh_secret.as_bytes()
    }

    /// Whether internal error details may be returned to clients.
    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case(APP_ENV_DEVELOPMENT)
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Comma-separated IP addresses; unparsable entries are logged and skipped.
fn parse_ip_list(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                tracing::warn!(entry, "Ignoring invalid TRUSTED_PROXIES entry");
                None
            }
        })
        .collect()
}

fn secret_from_env(key: &str, dev_default: &str) -> String {
    let secret = env::var(key).unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            tracing::warn!("{} not set, using insecure default for development", key);
            dev_default.to_string()
        } else {
            panic!("{} environment variable must be set in production", key);
        }
    });

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        panic!("{} must be at least {} characters long", key, MIN_JWT_SECRET_LENGTH);
    }

    secret
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let config = Config::new("a".repeat(32), "b".repeat(32));
        let printed = format!("{:?}", config);
        assert!(!printed.contains(&"a".repeat(32)));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn trusted_proxies_skip_bad_entries() {
        assert_eq!(
            parse_ip_list(" 10.0.0.1, nonsense,,::1"),
            vec!["10.0.0.1".parse::<IpAddr>().unwrap(), "::1".parse().unwrap()]
        );
    }

    #[test]
    fn development_flag_is_case_insensitive() {
        let mut config = Config::new("a".repeat(32), "b".repeat(32));
        assert!(!config.is_development());
        config.app_env = "Development".to_string();
        assert!(config.is_development());
    }
}
