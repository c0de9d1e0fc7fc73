use crate::organizations::OrgVisibility;
use crate::utils::get_env_with_prefix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Shortest HS256 secret accepted, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Main configuration for the API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub organizations: OrgAccessConfig,
    /// Expose internal error details in responses.
    #[serde(default)]
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Access token verification settings.
#[derive(Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the token issuer.
    pub jwt_secret: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: None,
            audience: None,
            leeway_seconds: default_leeway(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

/// Organization access behaviour shared by all routes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrgAccessConfig {
    /// Answer non-members of missing organizations with 404 instead of 403.
    #[serde(default)]
    pub reveal_missing_organizations: bool,
}

impl OrgAccessConfig {
    pub fn visibility(&self) -> OrgVisibility {
        if self.reveal_missing_organizations {
            OrgVisibility::Reveal
        } else {
            OrgVisibility::Conceal
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_leeway() -> u64 {
    30
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Reasons [`ConfigBuilder::build`] refuses a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address {address}: {source}")]
    InvalidAddress {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("Server port must be greater than 0")]
    ZeroPort,

    #[error("Maximum body size must be greater than 0")]
    ZeroBodySize,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("JWT secret must be at least {MIN_JWT_SECRET_LEN} bytes")]
    WeakJwtSecret,
}

/// Builder for [`Config`] with environment variable support.
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth.jwt_secret = Some(secret.into());
        self
    }

    pub fn with_jwt_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.config.auth.issuer = Some(issuer.into());
        self
    }

    pub fn with_jwt_audience(mut self, audience: impl Into<String>) -> Self {
        self.config.auth.audience = Some(audience.into());
        self
    }

    pub fn with_jwt_leeway(mut self, seconds: u64) -> Self {
        self.config.auth.leeway_seconds = seconds;
        self
    }

    pub fn with_reveal_missing_organizations(mut self, reveal: bool) -> Self {
        self.config.organizations.reveal_missing_organizations = reveal;
        self
    }

    pub fn with_dev_mode(mut self, enabled: bool) -> Self {
        self.config.dev_mode = enabled;
        self
    }

    /// Load configuration from environment variables with the `LEDGERGATE_`
    /// prefix, falling back to unprefixed names.
    pub fn from_env(self) -> Self {
        self.from_source(get_env_with_prefix)
    }

    /// Load configuration from an arbitrary key lookup. Unparsable values
    /// are ignored and leave the current setting in place.
    pub fn from_source(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).map(|v| matches!(v.as_str(), "true" | "1"));

        if let Some(host) = lookup("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.parse().ok()) {
            self.config.server.port = port;
        }
        if let Some(size) = lookup("MAX_BODY_SIZE").and_then(|v| v.parse().ok()) {
            self.config.server.max_body_size = size;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = flag("LOG_JSON") {
            self.config.logging.json = json;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.config.auth.jwt_secret = Some(secret);
        }
        if let Some(issuer) = lookup("JWT_ISSUER") {
            self.config.auth.issuer = Some(issuer);
        }
        if let Some(audience) = lookup("JWT_AUDIENCE") {
            self.config.auth.audience = Some(audience);
        }
        if let Some(leeway) = lookup("JWT_LEEWAY_SECONDS").and_then(|v| v.parse().ok()) {
            self.config.auth.leeway_seconds = leeway;
        }
        if let Some(reveal) = flag("REVEAL_MISSING_ORGANIZATIONS") {
            self.config.organizations.reveal_missing_organizations = reveal;
        }
        if let Some(dev) = flag("DEV_MODE") {
            self.config.dev_mode = dev;
        }

        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the server address, port, body limit or log level
    /// is invalid, or if a JWT secret is set but too short.
    pub fn build(self) -> Result<Config, ConfigError> {
        let server = &self.config.server;
        server.addr().map_err(|source| ConfigError::InvalidAddress {
            address: format!("{}:{}", server.host, server.port),
            source,
        })?;

        if server.port == 0 {
            return Err(ConfigError::ZeroPort);
        }

        if server.max_body_size == 0 {
            return Err(ConfigError::ZeroBodySize);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.config.logging.level));
        }

        if self
            .config
            .auth
            .jwt_secret
            .as_ref()
            .is_some_and(|s| s.len() < MIN_JWT_SECRET_LEN)
        {
            return Err(ConfigError::WeakJwtSecret);
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
