//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use tiffin::HubConfig;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Sync hub channel sizes
    pub hub: HubConfig,
    /// Inbound websocket frame limits
    pub rate_limit: RateLimitConfig,
    /// Prometheus scrape address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Per-connection inbound frame limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Frames allowed per second
    pub burst_per_second: usize,
    /// Frames allowed per minute
    pub sustained_per_minute: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst_per_second: 10,
            sustained_per_minute: 100,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `queue_capacity_override` - Optional outbound queue size override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        queue_capacity_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            bind_override,
            queue_capacity_override,
        )
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(
        lookup: F,
        bind_override: Option<SocketAddr>,
        queue_capacity_override: Option<usize>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_required(
                "SERVER_BIND",
                lookup("SERVER_BIND").as_deref().unwrap_or(DEFAULT_BIND),
            )?,
        };

        let metrics_bind = lookup("METRICS_BIND")
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_required("METRICS_BIND", &v))
            .transpose()?;

        let defaults = HubConfig::default();
        let hub = HubConfig {
            inbox_capacity: parse_or(&lookup, "HUB_INBOX_CAPACITY", defaults.inbox_capacity),
            outbound_capacity: queue_capacity_override.unwrap_or_else(|| {
                parse_or(&lookup, "OUTBOUND_QUEUE_CAPACITY", defaults.outbound_capacity)
            }),
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            burst_per_second: parse_or(&lookup, "WS_BURST_LIMIT", defaults.burst_per_second),
            sustained_per_minute: parse_or(
                &lookup,
                "WS_SUSTAINED_LIMIT",
                defaults.sustained_per_minute,
            ),
        };

        Ok(ServerConfig {
            bind,
            hub,
            rate_limit,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.inbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "HUB_INBOX_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.hub.outbound_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "OUTBOUND_QUEUE_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.rate_limit.burst_per_second == 0 {
            return Err(ConfigError::Invalid {
                var: "WS_BURST_LIMIT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.rate_limit.sustained_per_minute < self.rate_limit.burst_per_second {
            return Err(ConfigError::Invalid {
                var: "WS_SUSTAINED_LIMIT".to_string(),
                reason: format!(
                    "Must be at least the burst limit ({})",
                    self.rate_limit.burst_per_second
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a value that must be well-formed when present
fn parse_required<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: key.to_string(),
        reason: e.to_string(),
    })
}

/// Helper to parse a variable with default fallback
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
