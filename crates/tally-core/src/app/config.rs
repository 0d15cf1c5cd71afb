//! ReconcilerConfig - 実行時設定
//!
//! JSON ファイルから読み込むか、デフォルト値を使う。欠けたフィールドは
//! デフォルトで埋める。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::decision::EngineConfig;
use crate::domain::ids::GroupId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Minimum seconds between two reminder rounds of the same poll.
    pub notify_window_secs: u64,

    /// How many times a conflicting write is re-read and retried.
    pub max_conflict_retries: u32,

    /// Where result messages go. `None` means the poll's own group.
    pub results_channel: Option<GroupId>,

    pub reconcile_period_ms: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            notify_window_secs: 900,
            max_conflict_retries: 5,
            results_channel: None,
            reconcile_period_ms: 30_000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("reconcile_period_ms must be greater than zero")]
    ZeroPeriod,
}

impl ReconcilerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config = Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// tokio::time::interval panics on a zero period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(())
    }

    pub fn notify_window(&self) -> Duration {
        Duration::from_secs(self.notify_window_secs)
    }

    pub fn reconcile_period(&self) -> Duration {
        Duration::from_millis(self.reconcile_period_ms)
    }

    /// The part of the configuration the pure engine sees.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            notify_window: self.notify_window(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ReconcilerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ReconcilerConfig::default());
        assert_eq!(config.engine().notify_window, Duration::from_secs(900));
    }

    #[test]
    fn partial_override() {
        let config = ReconcilerConfig::from_json_str(
            r#"{"notify_window_secs": 60, "results_channel": "C-results"}"#,
        )
        .unwrap();
        assert_eq!(config.notify_window(), Duration::from_secs(60));
        assert_eq!(config.results_channel, Some(GroupId::new("C-results")));
        assert_eq!(config.max_conflict_retries, 5);
    }

    #[test]
    fn zero_period_is_rejected() {
        let config = ReconcilerConfig {
            reconcile_period_ms: 0,
            ..ReconcilerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPeriod)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ReconcilerConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
