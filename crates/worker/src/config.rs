use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

/// Output format of the worker's own logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("unknown log format '{other}', expected 'text' or 'json'"),
        }
    }
}

/// Worker configuration loaded from environment variables.
///
/// Every field has a default suitable for local use.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Parent of per-run scratch directories; system temp dir when unset.
    pub work_dir: Option<PathBuf>,
    pub docker_binary: String,
    /// Applied to tasks that set no `timeout`.
    pub default_timeout: Duration,
    pub log_queue_capacity: usize,
    pub log_format: LogFormat,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            docker_binary: "docker".into(),
            default_timeout: Duration::from_secs(3600),
            log_queue_capacity: scriptrun_events::queue::DEFAULT_CAPACITY,
            log_format: LogFormat::Text,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default    |
    /// |----------------------------------|------------|
    /// | `SCRIPTRUN_WORK_DIR`             | system tmp |
    /// | `SCRIPTRUN_DOCKER_BIN`           | `docker`   |
    /// | `SCRIPTRUN_DEFAULT_TIMEOUT_SECS` | `3600`     |
    /// | `SCRIPTRUN_LOG_QUEUE_CAPACITY`   | `1024`     |
    /// | `SCRIPTRUN_LOG_FORMAT`           | `text`     |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let work_dir = var("SCRIPTRUN_WORK_DIR").map(PathBuf::from);

        let docker_binary = var("SCRIPTRUN_DOCKER_BIN").unwrap_or(defaults.docker_binary);

        let default_timeout = match var("SCRIPTRUN_DEFAULT_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .trim()
                    .parse()
                    .context("SCRIPTRUN_DEFAULT_TIMEOUT_SECS must be a valid u64")?;
                if secs == 0 {
                    bail!("SCRIPTRUN_DEFAULT_TIMEOUT_SECS must be positive");
                }
                Duration::from_secs(secs)
            }
            None => defaults.default_timeout,
        };

        let log_queue_capacity = match var("SCRIPTRUN_LOG_QUEUE_CAPACITY") {
            Some(v) => {
                let capacity: usize = v
                    .trim()
                    .parse()
                    .context("SCRIPTRUN_LOG_QUEUE_CAPACITY must be a valid usize")?;
                if capacity == 0 {
                    bail!("SCRIPTRUN_LOG_QUEUE_CAPACITY must be positive");
                }
                capacity
            }
            None => defaults.log_queue_capacity,
        };

        let log_format = match var("SCRIPTRUN_LOG_FORMAT") {
            Some(v) => v.parse().context("Invalid SCRIPTRUN_LOG_FORMAT")?,
            None => defaults.log_format,
        };

        Ok(Self {
            work_dir,
            docker_binary,
            default_timeout,
            log_queue_capacity,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = WorkerConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.default_timeout, Duration::from_secs(3600));
        assert_eq!(config.log_queue_capacity, 1024);
    }

    #[test]
    fn values_are_read() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("SCRIPTRUN_WORK_DIR", "/var/lib/scriptrun"),
            ("SCRIPTRUN_DOCKER_BIN", "podman"),
            ("SCRIPTRUN_DEFAULT_TIMEOUT_SECS", "60"),
            ("SCRIPTRUN_LOG_QUEUE_CAPACITY", "16"),
            ("SCRIPTRUN_LOG_FORMAT", "JSON"),
        ]))
        .expect("config");

        assert_eq!(config.work_dir, Some(PathBuf::from("/var/lib/scriptrun")));
        assert_eq!(config.docker_binary, "podman");
        assert_eq!(config.default_timeout, Duration::from_secs(60));
        assert_eq!(config.log_queue_capacity, 16);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = WorkerConfig::from_lookup(lookup(&[("SCRIPTRUN_DEFAULT_TIMEOUT_SECS", "soon")]))
            .expect_err("should fail");
        assert!(err.to_string().contains("SCRIPTRUN_DEFAULT_TIMEOUT_SECS"));

        assert!(WorkerConfig::from_lookup(lookup(&[("SCRIPTRUN_LOG_QUEUE_CAPACITY", "0")])).is_err());
        assert!(WorkerConfig::from_lookup(lookup(&[("SCRIPTRUN_LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = WorkerConfig::from_lookup(lookup(&[("SCRIPTRUN_DOCKER_BIN", "  ")]))
            .expect("config");
        assert_eq!(config.docker_binary, "docker");
    }
}
