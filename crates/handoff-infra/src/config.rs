//! Data directory resolution and configuration loading.
//!
//! Reads `config.toml` from the data directory (`~/.handoff/` by default) and
//! deserializes it into [`HandoffConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use handoff_types::config::HandoffConfig;

/// Resolve the data directory.
///
/// Priority:
/// 1. `HANDOFF_DATA_DIR` environment variable
/// 2. `~/.handoff`
/// 3. `./.handoff`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HANDOFF_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".handoff");
    }

    PathBuf::from(".handoff")
}

/// Load configuration from `{data_dir}/config.toml`.
pub async fn load_config(data_dir: &Path) -> HandoffConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return HandoffConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return HandoffConfig::default();
        }
    };

    match toml::from_str::<HandoffConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            HandoffConfig::default()
        }
    }
}

/// Idle threshold from config, clamped to what `TimeDelta` can represent.
pub fn idle_timeout(config: &HandoffConfig) -> TimeDelta {
    let secs = i64::try_from(config.idle_timeout_secs).unwrap_or(i64::MAX);
    TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert!(!config.reject_requests_without_endpoint);
        assert_eq!(config.idle_timeout_secs, 1800);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "reject_requests_without_endpoint = true\nidle_timeout_secs = 90\n",
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert!(config.reject_requests_without_endpoint);
        assert_eq!(config.idle_timeout_secs, 90);
    }

    #[tokio::test]
    async fn load_config_malformed_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is {{ not toml")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.idle_timeout_secs, 1800);
    }

    #[test]
    fn idle_timeout_converts_seconds() {
        let config = HandoffConfig {
            idle_timeout_secs: 120,
            ..Default::default()
        };
        assert_eq!(idle_timeout(&config), TimeDelta::minutes(2));

        let huge = HandoffConfig {
            idle_timeout_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(idle_timeout(&huge), TimeDelta::MAX);
    }
}
