//! Sync hub configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_INBOX_CAPACITY: usize = 1024;
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Channel sizes for the hub and its connections.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HubConfig {
    /// Pending messages the hub inbox holds before senders wait.
    pub inbox_capacity: usize,

    /// Frames a single connection may have queued before it is dropped as a
    /// slow consumer.
    pub outbound_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl HubConfig {
    /// Validate hub configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.inbox_capacity == 0 {
            return Err("Hub inbox capacity must be at least 1".to_string());
        }

        if self.outbound_capacity == 0 {
            return Err("Outbound queue capacity must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HubConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.outbound_capacity, 256);
        assert_eq!(config.inbox_capacity, 1024);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = HubConfig {
            outbound_capacity: 0,
            ..HubConfig::default()
        };
        assert!(config.validate().is_err());

        let config = HubConfig {
            inbox_capacity: 0,
            ..HubConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
