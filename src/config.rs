//! Process configuration, read from the environment once at startup and
//! passed by reference to whatever needs it.

use std::path::PathBuf;

/// Token signing algorithm. Fixed, not configurable.
pub const TOKEN_ALGORITHM: &str = "HS256";

const DEFAULT_SECRET: &str = "change-this-in-production";

#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite file location. `None` means the platform default data dir.
    pub database_path: Option<PathBuf>,
    /// HMAC secret for access tokens.
    pub secret_key: String,
    /// Access token lifetime, in minutes.
    pub token_expire_minutes: u64,
    /// Declared but not enforced anywhere.
    pub rate_limit_per_minute: u64,
    /// Fallback log filter when RUST_LOG is unset.
    pub log_level: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var_os("DATABASE_PATH").map(PathBuf::from),
            secret_key: std::env::var("SECRET_KEY")
                .unwrap_or_else(|_| DEFAULT_SECRET.to_string()),
            token_expire_minutes: env_u64("ACCESS_TOKEN_EXPIRE_MINUTES", 30),
            rate_limit_per_minute: env_u64("RATE_LIMIT_PER_MINUTE", 60),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_expire_minutes as i64)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            secret_key: DEFAULT_SECRET.to_string(),
            token_expire_minutes: 30,
            rate_limit_per_minute: 60,
            log_level: "info".to_string(),
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
