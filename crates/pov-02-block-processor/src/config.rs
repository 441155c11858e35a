//! Block processor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the admission loop and its buffering pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Capacity of the bounded admission channel.
    pub channel_capacity: usize,
    /// Maximum buffered orphan blocks.
    pub max_orphan_blocks: usize,
    /// Orphan lifetime in seconds.
    pub orphan_ttl_secs: u64,
    /// Maximum blocks waiting for transactions.
    pub max_pending_blocks: usize,
    /// Pending-block lifetime in seconds.
    pub pending_ttl_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            max_orphan_blocks: 1000,
            orphan_ttl_secs: 3600,
            max_pending_blocks: 1000,
            pending_ttl_secs: 3600,
        }
    }
}

impl ProcessorConfig {
    /// Small pools for tests.
    pub fn for_testing() -> Self {
        Self {
            channel_capacity: 64,
            max_orphan_blocks: 16,
            orphan_ttl_secs: 60,
            max_pending_blocks: 16,
            pending_ttl_secs: 60,
        }
    }

    pub fn orphan_ttl(&self) -> Duration {
        Duration::from_secs(self.orphan_ttl_secs)
    }

    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.channel_capacity, 1024);
        assert_eq!(config.max_orphan_blocks, 1000);
        assert_eq!(config.orphan_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ProcessorConfig =
            serde_json::from_str(r#"{ "max_orphan_blocks": 5 }"#).unwrap();
        assert_eq!(config.max_orphan_blocks, 5);
        assert_eq!(config.pending_ttl_secs, 3600);
    }
}
