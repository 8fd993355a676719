use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use workbench_engine::{CacheTtls, Clock, EngineConfig};
use workbench_logging::workbench_info;

pub const CONFIG_FILENAME: &str = "workbench.ron";
pub const CONFIG_ENV: &str = "WORKBENCH_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// User settings read from `workbench.ron`. Every field may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    pub data_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub problem_list_ttl_mins: u64,
    pub statement_ttl_hours: u64,
    pub translation_ttl_hours: u64,
    pub base_url: String,
    pub fetch_timeout_secs: u64,
    pub fetch_attempts: u32,
    /// curl-compatible command tried after every attempt failed; empty disables it.
    pub fetch_fallback_command: Vec<String>,
    pub time_limit_secs: u64,
    pub translator_command: Vec<String>,
    pub translator_timeout_secs: u64,
    pub install_poll_millis: u64,
    /// Longest wait for a single engine result before the CLI gives up.
    pub engine_wait_secs: u64,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".workbench"),
            log_file: None,
            problem_list_ttl_mins: 30,
            statement_ttl_hours: 7 * 24,
            translation_ttl_hours: 7 * 24,
            base_url: "https://codeforces.com".to_string(),
            fetch_timeout_secs: 10,
            fetch_attempts: 3,
            fetch_fallback_command: vec!["curl".to_string()],
            time_limit_secs: 2,
            translator_command: vec!["python3".to_string(), "translation_support.py".to_string()],
            translator_timeout_secs: 120,
            install_poll_millis: 800,
            engine_wait_secs: 300,
        }
    }
}

impl WorkbenchConfig {
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            problem_list: Duration::from_secs(self.problem_list_ttl_mins * 60),
            statement: Duration::from_secs(self.statement_ttl_hours * 3600),
            translation: Duration::from_secs(self.translation_ttl_hours * 3600),
        }
    }

    pub fn engine_wait(&self) -> Duration {
        Duration::from_secs(self.engine_wait_secs.max(1))
    }

    pub fn to_engine_config(&self, clock: Arc<dyn Clock>) -> EngineConfig {
        let mut config = EngineConfig::default_with_data_dir(self.data_dir.clone(), clock);
        config.ttls = self.ttls();
        config.fetch.base_url = self.base_url.trim_end_matches('/').to_string();
        config.fetch.request_timeout = Duration::from_secs(self.fetch_timeout_secs);
        config.fetch.attempts = self.fetch_attempts.max(1);
        config.fetch.fallback_command = self.fetch_fallback_command.clone();
        config.exec.time_limit = Duration::from_secs(self.time_limit_secs.max(1));
        if !self.translator_command.is_empty() {
            config.translator.command = self.translator_command.clone();
        }
        config.translator.timeout = Duration::from_secs(self.translator_timeout_secs.max(1));
        config.install_poll_interval = Duration::from_millis(self.install_poll_millis);
        config
    }
}

/// Wall clock for cache timestamps.
pub struct ChronoClock;

impl Clock for ChronoClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Reads the config named by `WORKBENCH_CONFIG`, or `./workbench.ron` when
/// the variable is unset. Only the implicit file may be missing.
pub fn load_config() -> Result<WorkbenchConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => load_from(Path::new(&path), true),
        None => load_from(Path::new(CONFIG_FILENAME), false),
    }
}

pub fn load_from(path: &Path, required: bool) -> Result<WorkbenchConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
            workbench_info!("No config at {:?}; using defaults", path);
            return Ok(WorkbenchConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    workbench_info!("Loaded config from {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "(data_dir: \"cache\", time_limit_secs: 5)").unwrap();

        let config = load_from(&path, true).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("cache"));
        assert_eq!(config.time_limit_secs, 5);
        assert_eq!(config.fetch_attempts, 3);
        assert_eq!(config.ttls(), CacheTtls::default());
    }

    #[test]
    fn missing_file_is_only_an_error_when_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ron");

        assert_eq!(load_from(&path, false).unwrap(), WorkbenchConfig::default());
        assert!(matches!(load_from(&path, true), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "(data_dir: 12").unwrap();
        assert!(matches!(load_from(&path, false), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn engine_config_follows_settings() {
        let config = WorkbenchConfig {
            base_url: "http://localhost:9000/".to_string(),
            fetch_attempts: 0,
            install_poll_millis: 50,
            fetch_fallback_command: Vec::new(),
            translator_timeout_secs: 0,
            ..WorkbenchConfig::default()
        };
        let engine = config.to_engine_config(Arc::new(ChronoClock));
        assert_eq!(engine.fetch.base_url, "http://localhost:9000");
        assert_eq!(engine.fetch.attempts, 1);
        assert_eq!(engine.install_poll_interval, Duration::from_millis(50));
        assert_eq!(engine.exec.time_limit, Duration::from_secs(2));
        assert!(engine.fetch.fallback_command.is_empty());
        assert_eq!(engine.translator.timeout, Duration::from_secs(1));
    }
}
