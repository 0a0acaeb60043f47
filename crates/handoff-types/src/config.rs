//! Configuration types for Handoff.
//!
//! `HandoffConfig` represents the top-level `config.toml` read from the data
//! directory. Every field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Refuse new connection requests while no aggregation endpoint is registered.
    #[serde(default)]
    pub reject_requests_without_endpoint: bool,

    /// Connections with no activity for this many seconds are reported as idle.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    1800
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            reject_requests_without_endpoint: false,
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = HandoffConfig::default();
        assert!(!config.reject_requests_without_endpoint);
        assert_eq!(config.idle_timeout_secs, 1800);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: HandoffConfig = toml::from_str("").unwrap();
        assert!(!config.reject_requests_without_endpoint);
        assert_eq!(config.idle_timeout_secs, 1800);
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
reject_requests_without_endpoint = true
idle_timeout_secs = 600
"#;
        let config: HandoffConfig = toml::from_str(toml_str).unwrap();
        assert!(config.reject_requests_without_endpoint);
        assert_eq!(config.idle_timeout_secs, 600);
    }
}
