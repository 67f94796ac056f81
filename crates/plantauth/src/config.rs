//! Authorization configuration.
//!
//! Loading is layered: an optional TOML file, then `PLANTAUTH__*`
//! environment variables, then validation.
//!
//! # Example (TOML)
//!
//! ```toml
//! [claims]
//! issuer = "PlantAuth"
//! disable_project_user_data_claims = false
//!
//! [cache]
//! person_cache_minutes = 1440
//! plant_cache_minutes = 60
//! permission_cache_minutes = 20
//!
//! [main_api]
//! base_address = "https://mainapi.example.com/api/"
//! request_timeout = "200s"
//!
//! [redis]
//! enabled = true
//! url = "redis://localhost:6379"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use plantauth_cache::{CacheDuration, RedisConfig};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AuthzError, AuthzResult};

const DEFAULT_CONFIG_FILE: &str = "plantauth.toml";
const ENV_PREFIX: &str = "PLANTAUTH";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Claims augmentation options.
    pub claims: ClaimsOptions,

    /// TTL classes for the person and permission caches.
    pub cache: CacheOptions,

    /// L2 cache tier.
    pub redis: RedisConfig,

    /// Remote authority (main API) connection.
    pub main_api: MainApiOptions,

    /// Logging.
    pub logging: LoggingConfig,
}

/// Claims augmentation options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClaimsOptions {
    /// Issuer name every augmented claim carries, and the label of the
    /// identity that holds them.
    pub issuer: String,

    /// Skip the `PROJECT##` user-data claims.
    pub disable_project_user_data_claims: bool,

    /// Skip the `RESTRICTIONROLE##` user-data claims.
    pub disable_restriction_role_user_data_claims: bool,
}

impl Default for ClaimsOptions {
    fn default() -> Self {
        Self {
            issuer: "PlantAuth".to_string(),
            disable_project_user_data_claims: false,
            disable_restriction_role_user_data_claims: false,
        }
    }
}

/// TTL classes, in minutes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheOptions {
    pub person_cache_minutes: u64,
    pub plant_cache_minutes: u64,
    pub permission_cache_minutes: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            person_cache_minutes: 1440, // 1 day
            plant_cache_minutes: 60,
            permission_cache_minutes: 20,
        }
    }
}

impl CacheOptions {
    /// TTL class for person lookups and tenant listings.
    #[must_use]
    pub fn person_duration(&self) -> CacheDuration {
        CacheDuration::Minutes(self.person_cache_minutes)
    }

    /// TTL class for a user's plant list.
    #[must_use]
    pub fn plant_duration(&self) -> CacheDuration {
        CacheDuration::Minutes(self.plant_cache_minutes)
    }

    /// TTL class for everything scoped to (user, plant).
    #[must_use]
    pub fn permission_duration(&self) -> CacheDuration {
        CacheDuration::Minutes(self.permission_cache_minutes)
    }
}

/// Main API connection options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MainApiOptions {
    /// Base address; relative resource paths are joined onto it.
    pub base_address: String,

    /// Value of the `api-version` query parameter.
    pub api_version: String,

    /// Name posted when tracing plant usage.
    pub client_friendly_name: String,

    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for MainApiOptions {
    fn default() -> Self {
        Self {
            base_address: "http://localhost:5000/api/".to_string(),
            api_version: "4.1".to_string(),
            client_friendly_name: "plantauth".to_string(),
            request_timeout: Duration::from_secs(200),
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `plantauth=debug,info`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AuthzConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Configuration` if:
    /// - The claims issuer is empty
    /// - Any TTL class is zero minutes
    /// - The L1 cleanup interval is zero
    /// - The main API base address is not an absolute URL
    /// - The log level is not a known level
    pub fn validate(&self) -> AuthzResult<()> {
        if self.claims.issuer.trim().is_empty() {
            return Err(AuthzError::configuration("claims.issuer cannot be empty"));
        }

        for (name, minutes) in [
            ("person_cache_minutes", self.cache.person_cache_minutes),
            ("plant_cache_minutes", self.cache.plant_cache_minutes),
            ("permission_cache_minutes", self.cache.permission_cache_minutes),
        ] {
            if minutes == 0 {
                return Err(AuthzError::configuration(format!(
                    "cache.{name} must be > 0"
                )));
            }
        }

        if self.redis.cleanup_interval.is_zero() {
            return Err(AuthzError::configuration(
                "redis.cleanup_interval must be > 0",
            ));
        }

        Url::parse(&self.main_api.base_address).map_err(|e| {
            AuthzError::configuration(format!(
                "main_api.base_address '{}' is not a valid URL: {e}",
                self.main_api.base_address
            ))
        })?;

        if self.main_api.request_timeout.is_zero() {
            return Err(AuthzError::configuration(
                "main_api.request_timeout must be > 0",
            ));
        }

        // Accept plain levels only; directive strings go through RUST_LOG.
        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(AuthzError::configuration(format!(
                    "Invalid logging.level: '{other}'. Must be trace, debug, info, warn, or error"
                )));
            }
        }

        Ok(())
    }
}

/// Load configuration from `path` (or `plantauth.toml` when present) and
/// `PLANTAUTH__SECTION__KEY` environment variables, then validate it.
///
/// A missing file is not an error; defaults and the environment apply.
pub fn load_config(path: Option<&str>) -> AuthzResult<AuthzConfig> {
    let mut builder = Config::builder();
    let file = path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if file.exists() {
        builder = builder.add_source(File::from(file));
    }
    // Environment variable overrides, e.g., PLANTAUTH__CACHE__PLANT_CACHE_MINUTES=30
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__"),
    );

    let merged: AuthzConfig = builder
        .build()
        .map_err(|e| AuthzError::configuration(format!("config build error: {e}")))?
        .try_deserialize()
        .map_err(|e| AuthzError::configuration(format!("config deserialize error: {e}")))?;

    merged.validate()?;
    Ok(merged)
}
