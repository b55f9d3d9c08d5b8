//! Application settings loaded via OrthoConfig.
//!
//! Values come from `HELPDESK_*` environment variables, an optional config
//! file and command-line flags, in OrthoConfig's usual precedence.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{AdminSeed, Email, NewPassword, RetryPolicy, UserName};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// Problems with the loaded settings that OrthoConfig cannot express.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("HELPDESK_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("HELPDESK_ADMIN_EMAIL and HELPDESK_ADMIN_PASSWORD must be set together")]
    PartialAdminSeed,
    #[error("invalid administrator seed: {0}")]
    AdminSeed(String),
}

/// Server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HELPDESK")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    #[ortho_config(default = 10)]
    pub db_pool_size: u32,
    /// Seconds to wait for a pooled connection.
    #[ortho_config(default = 30)]
    pub db_connect_timeout_secs: u64,
    /// Attempts per store call, including the first.
    #[ortho_config(default = 3)]
    pub retry_max_attempts: u32,
    #[ortho_config(default = 50)]
    pub retry_initial_backoff_ms: u64,
    #[ortho_config(default = 1000)]
    pub retry_max_backoff_ms: u64,
    /// Administrator created at start-up when the email is unregistered.
    pub admin_email: Option<String>,
    pub admin_name: Option<String>,
    pub admin_password: Option<String>,
}

impl AppSettings {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// [`SettingsError::BindAddr`] when the value is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Pool configuration for the database URL.
    ///
    /// # Errors
    ///
    /// [`SettingsError::MissingDatabaseUrl`] when no URL is configured.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let url = self
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)?;
        Ok(PoolConfig::new(url)
            .with_max_size(self.db_pool_size.max(1))
            .with_connection_timeout(Duration::from_secs(self.db_connect_timeout_secs)))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry_max_backoff_ms),
        }
    }

    /// Administrator bootstrap details, if configured.
    ///
    /// # Errors
    ///
    /// When only one of email and password is set, or either fails
    /// validation.
    pub fn admin_seed(&self) -> Result<Option<AdminSeed>, SettingsError> {
        let (email, password) = match (&self.admin_email, &self.admin_password) {
            (None, None) => return Ok(None),
            (Some(email), Some(password)) => (email, password),
            _ => return Err(SettingsError::PartialAdminSeed),
        };
        let name = self.admin_name.as_deref().unwrap_or(DEFAULT_ADMIN_NAME);
        Ok(Some(AdminSeed {
            name: UserName::new(name).map_err(|err| SettingsError::AdminSeed(err.to_string()))?,
            email: Email::new(email).map_err(|err| SettingsError::AdminSeed(err.to_string()))?,
            password: NewPassword::new(password)
                .map_err(|err| SettingsError::AdminSeed(err.to_string()))?,
        }))
    }
}
