use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub rate_limit_enabled: bool,
    pub rate_limiter_times: u32,
    pub rate_limiter_window: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if cfg!(debug_assertions) => "secret".to_string(),
            _ => return Err("JWT_SECRET environment variable must be set in production".to_string()),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://contactbook.db?mode=rwc".to_string()),
            port: parse_var("PORT").unwrap_or(8000),
            jwt_secret,
            jwt_expiry_hours: parse_var("JWT_EXPIRY_HOURS").unwrap_or(24),
            rate_limit_enabled: env::var("RATE_LIMIT_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            rate_limiter_times: parse_var("RATE_LIMITER_TIMES").unwrap_or(10),
            rate_limiter_window: Duration::from_secs(parse_var("RATE_LIMITER_SECONDS").unwrap_or(60)),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(Vec::new),
        })
    }
}

impl Default for Config {
    /// Local development settings: in-memory database, 10 requests per minute.
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 8000,
            jwt_secret: "secret".to_string(),
            jwt_expiry_hours: 24,
            rate_limit_enabled: true,
            rate_limiter_times: 10,
            rate_limiter_window: Duration::from_secs(60),
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
