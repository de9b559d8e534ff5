//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `SECRET_KEY` - JWT signing secret (min 32 chars)
//! - `TELEGRAM_BOT_TOKEN` - Telegram Bot API token (bot binary only)
//! - `ADMIN_TELEGRAM_ID` - Telegram ID that bootstraps the admin account
//! - `ADMIN_USERNAME` - Login assigned to the bootstrapped admin
//! - `ADMIN_PASSWORD` - Password assigned to the bootstrapped admin
//!
//! ## Optional
//! - `TELEGRAM_BOT_USERNAME` - Bot username for `t.me` deep links
//! - `SERVER_HOST` - Bind address (default: 127.0.0.1)
//! - `SERVER_PORT` - Listen port (default: 8000)
//! - `BASE_URL` - Public URL of the web UI (default: http://localhost:8000)
//! - `UPLOAD_DIR` - Product image directory (default: uploads)
//! - `MAX_UPLOAD_BYTES` - Upload size cap (default: 5 MiB)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use tablecraft_core::TelegramId;

/// JWT signing algorithm. Fixed, not configurable.
pub const TOKEN_ALGORITHM: jsonwebtoken::Algorithm = jsonwebtoken::Algorithm::HS256;

/// Access token lifetime in minutes.
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

const MIN_SECRET_KEY_LENGTH: usize = 32;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration shared by the server, bot, and CLI.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the web UI
    pub base_url: String,
    /// JWT signing secret
    pub secret_key: SecretString,
    /// Telegram bot configuration
    pub telegram: TelegramConfig,
    /// Admin bootstrap configuration
    pub admin: AdminBootstrapConfig,
    /// Directory product images are stored in
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: u64,
}

/// Telegram Bot API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot API token from `@BotFather`
    pub bot_token: SecretString,
    /// Bot username, used to build `t.me` deep links
    pub bot_username: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("bot_username", &self.bot_username)
            .finish()
    }
}

/// Identity and credentials for the admin account that is auto-provisioned
/// on first Telegram contact.
#[derive(Clone)]
pub struct AdminBootstrapConfig {
    /// Telegram ID recognised as the platform administrator
    pub telegram_id: TelegramId,
    /// Login assigned to the bootstrapped admin account
    pub username: String,
    /// Password assigned to the bootstrapped admin account
    pub password: SecretString,
}

impl std::fmt::Debug for AdminBootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrapConfig")
            .field("telegram_id", &self.telegram_id)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the secret key fails the length check.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("SERVER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SERVER_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("SERVER_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SERVER_PORT".to_owned(), e.to_string()))?;
        let base_url = get_env_or_default("BASE_URL", "http://localhost:8000");

        let secret_key = get_required_secret("SECRET_KEY")?;
        validate_secret_key(&secret_key, "SECRET_KEY")?;

        let telegram = TelegramConfig::from_env()?;
        let admin = AdminBootstrapConfig::from_env()?;

        let upload_dir = PathBuf::from(get_env_or_default("UPLOAD_DIR", "uploads"));
        let max_upload_bytes = get_env_or_default(
            "MAX_UPLOAD_BYTES",
            &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("MAX_UPLOAD_BYTES".to_owned(), e.to_string()))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            secret_key,
            telegram,
            admin,
            upload_dir,
            max_upload_bytes,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TelegramConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bot_token: get_required_secret("TELEGRAM_BOT_TOKEN")?,
            bot_username: get_env_or_default("TELEGRAM_BOT_USERNAME", "tablecraft_bot"),
        })
    }
}

impl AdminBootstrapConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let telegram_id = get_required_env("ADMIN_TELEGRAM_ID")?
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_TELEGRAM_ID".to_owned(), e.to_string())
            })?;

        Ok(Self {
            telegram_id: TelegramId::new(telegram_id),
            username: get_required_env("ADMIN_USERNAME")?,
            password: get_required_secret("ADMIN_PASSWORD")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Validate that the JWT secret meets minimum length requirements.
fn validate_secret_key(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SECRET_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("must be at least {MIN_SECRET_KEY_LENGTH} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secret_key_is_rejected() {
        let secret = SecretString::from("too-short");
        assert!(matches!(
            validate_secret_key(&secret, "SECRET_KEY"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn long_secret_key_passes() {
        let secret = SecretString::from("0123456789abcdef0123456789abcdef");
        assert!(validate_secret_key(&secret, "SECRET_KEY").is_ok());
    }
}
