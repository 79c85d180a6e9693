//! Redis configuration

use redis::IntoConnectionInfo;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    #[serde(default)]
    pub url: String,

    /// Overrides any password embedded in the URL
    pub password: Option<String>,

    /// Logical database index; overrides the URL path
    pub database: Option<i64>,

    /// Prefix for every key the store writes
    #[serde(default = "default_key_namespace")]
    pub key_namespace: String,

    /// Per-command timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds connection info from the URL plus the explicit overrides.
    pub fn connection_info(&self) -> redis::RedisResult<redis::ConnectionInfo> {
        let mut info = self.url.as_str().into_connection_info()?;
        if let Some(password) = &self.password {
            info.redis.password = Some(password.clone());
        }
        if let Some(database) = self.database {
            info.redis.db = database;
        }
        Ok(info)
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("XO__REDIS__URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.key_namespace.is_empty()
            || self
                .key_namespace
                .chars()
                .any(|c| c == ':' || c.is_whitespace())
        {
            return Err(ValidationError::InvalidKeyNamespace);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::NonPositive("redis.timeout_secs"));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            password: None,
            database: None,
            key_namespace: default_key_namespace(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_key_namespace() -> String {
    "xo".to_string()
}

fn default_timeout() -> u64 {
    1
}
