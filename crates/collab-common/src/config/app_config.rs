//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub jwt: JwtConfig,
    pub hub: HubConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Server bind configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// JWT validation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Lifetime of tokens minted by local tooling
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: i64,
}

/// Realtime hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Path prefix of the realtime endpoint; the `access_token` query
    /// parameter is only honoured below it
    #[serde(default = "default_hub_path_prefix")]
    pub path_prefix: String,
    /// Skip the revocation list for handshakes below `path_prefix`
    #[serde(default = "default_skip_revocation_check")]
    pub skip_revocation_check: bool,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    /// Capacity of each connection's outbound queue
    #[serde(default = "default_outbound_buffer_size")]
    pub outbound_buffer_size: usize,
}

impl HubConfig {
    /// Path of the document collaboration endpoint
    #[must_use]
    pub fn document_path(&self) -> String {
        format!("{}/document", self.path_prefix.trim_end_matches('/'))
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            path_prefix: default_hub_path_prefix(),
            skip_revocation_check: default_skip_revocation_check(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            outbound_buffer_size: default_outbound_buffer_size(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "scribble-collab".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_expiration_hours() -> i64 {
    24
}

fn default_hub_path_prefix() -> String {
    "/hubs".to_string()
}

fn default_skip_revocation_check() -> bool {
    true
}

fn default_heartbeat_interval_ms() -> u64 {
    45_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    90_000
}

fn default_outbound_buffer_size() -> usize {
    256
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    /// Returns an error if required variables are missing or malformed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::MissingVar(key));

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: parse_or(&lookup, "APP_ENV", default_env)?,
            },
            gateway: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port: parse_value("GATEWAY_PORT", &required("GATEWAY_PORT")?)?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                issuer: required("JWT_ISSUER")?,
                audience: required("JWT_AUDIENCE")?,
                expiration_hours: parse_or(&lookup, "JWT_EXPIRATION_HOURS", default_expiration_hours)?,
            },
            hub: HubConfig {
                path_prefix: lookup("HUB_PATH_PREFIX").unwrap_or_else(default_hub_path_prefix),
                skip_revocation_check: parse_or(
                    &lookup,
                    "HUB_SKIP_REVOCATION_CHECK",
                    default_skip_revocation_check,
                )?,
                heartbeat_interval_ms: parse_or(
                    &lookup,
                    "HEARTBEAT_INTERVAL_MS",
                    default_heartbeat_interval_ms,
                )?,
                heartbeat_timeout_ms: parse_or(
                    &lookup,
                    "HEARTBEAT_TIMEOUT_MS",
                    default_heartbeat_timeout_ms,
                )?,
                outbound_buffer_size: parse_or(
                    &lookup,
                    "OUTBOUND_BUFFER_SIZE",
                    default_outbound_buffer_size,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_else(default_allowed_origins),
            },
        })
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key, raw.to_string()))
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
