//! Configuration loading for the koscheck shell.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use koscheck_remote::RemoteConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KosConfig {
    /// Chat log to watch. Exactly one of `log_path` and `log_dir` is set.
    pub log_path: Option<PathBuf>,
    /// Directory to pick the newest `Fleet_*.txt` log from.
    pub log_dir: Option<PathBuf>,
    pub start_at_end: bool,
    pub poll_interval_ms: u64,
    pub log_format: LogFormat,
    pub cache: CacheConfig,
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    pub path: PathBuf,
    pub max_size_mb: usize,
    /// Lifetime of cached KOS list answers. 0 disables caching them.
    pub kos_ttl_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSettings {
    pub kos_url: String,
    pub esi_url: String,
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl RemoteSettings {
    pub fn to_remote_config(&self) -> RemoteConfig {
        RemoteConfig {
            kos_url: self.kos_url.clone(),
            esi_url: self.esi_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or KOSCHECK_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("Missing value for argument {0}")]
    MissingArgument(&'static str),
}

/// Command-line arguments understood by the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    /// Overrides `log_path` and `log_dir` from the file.
    pub log: Option<PathBuf>,
}

impl CliArgs {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse arguments, excluding the program name. Unknown arguments are
    /// ignored.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, ConfigError> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let value = args.next().ok_or(ConfigError::MissingArgument("--config"))?;
                    parsed.config = Some(PathBuf::from(value));
                }
                "--log" => {
                    let value = args.next().ok_or(ConfigError::MissingArgument("--log"))?;
                    parsed.log = Some(PathBuf::from(value));
                }
                _ => {}
            }
        }
        Ok(parsed)
    }
}

impl KosConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CliArgs::from_env()?)
    }

    pub fn load_from(args: CliArgs) -> Result<Self, ConfigError> {
        let path = args.config.clone().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let mut config = Self::from_path(&path)?;
        config.apply_args(&args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: KosConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(log) = &args.log {
            self.log_path = Some(log.clone());
            self.log_dir = None;
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.log_path, &self.log_dir) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidValue {
                    field: "log_path",
                    reason: "log_path and log_dir are mutually exclusive".to_string(),
                });
            }
            (None, None) => {
                return Err(ConfigError::InvalidValue {
                    field: "log_path",
                    reason: "log_path or log_dir must be provided".to_string(),
                });
            }
            (Some(path), None) if path.as_os_str().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    field: "log_path",
                    reason: "must not be empty".to_string(),
                });
            }
            (None, Some(dir)) if dir.as_os_str().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    field: "log_dir",
                    reason: "must not be empty".to_string(),
                });
            }
            _ => {}
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cache.path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.cache.max_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_size_mb",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.kos_ttl_secs < 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.kos_ttl_secs",
                reason: "must be >= 0".to_string(),
            });
        }
        if !is_http_url(&self.remote.kos_url) {
            return Err(ConfigError::InvalidValue {
                field: "remote.kos_url",
                reason: "must be an http(s) URL".to_string(),
            });
        }
        if !is_http_url(&self.remote.esi_url) {
            return Err(ConfigError::InvalidValue {
                field: "remote.esi_url",
                reason: "must be an http(s) URL".to_string(),
            });
        }
        if self.remote.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "remote.request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.remote.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "remote.user_agent",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("KOSCHECK_CONFIG").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
log_dir = "/home/pilot/EVE/logs/Chatlogs"
start_at_end = true
poll_interval_ms = 1000
log_format = "text"

[cache]
path = "/tmp/koscheck-cache"
max_size_mb = 64
kos_ttl_secs = 3600

[remote]
kos_url = "http://kos.cva-eve.org/api/"
esi_url = "https://esi.evetech.net/latest"
request_timeout_ms = 10000
user_agent = "koscheck/0.1"
"#;

    fn sample() -> KosConfig {
        KosConfig::from_toml(SAMPLE).expect("sample config should parse")
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = sample();
        config.validate().expect("sample config should validate");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(
            config.remote.to_remote_config().request_timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let contents = SAMPLE.replace("[cache]", "refresh_rate = 5\n\n[cache]");
        assert!(matches!(
            KosConfig::from_toml(&contents),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_log_source_must_be_exactly_one() {
        let mut config = sample();
        config.log_path = Some(PathBuf::from("/tmp/Fleet_20261019_120000.txt"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "log_path", .. })
        ));

        config.log_path = None;
        config.log_dir = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = sample();
        config.poll_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "poll_interval_ms", .. })
        ));

        let mut config = sample();
        config.cache.kos_ttl_secs = -1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "cache.kos_ttl_secs", .. })
        ));

        let mut config = sample();
        config.remote.kos_url = "kos.cva-eve.org".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "remote.kos_url", .. })
        ));
    }

    #[test]
    fn test_parse_args() {
        let parsed = CliArgs::parse(args(&["--config", "koscheck.toml", "--log", "Fleet.txt"]))
            .expect("args should parse");
        assert_eq!(parsed.config, Some(PathBuf::from("koscheck.toml")));
        assert_eq!(parsed.log, Some(PathBuf::from("Fleet.txt")));

        assert!(matches!(
            CliArgs::parse(args(&["--log"])),
            Err(ConfigError::MissingArgument("--log"))
        ));
    }

    #[test]
    fn test_log_argument_overrides_log_dir() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file creation should succeed");
        file.write_all(SAMPLE.as_bytes()).expect("write should succeed");

        let cli = CliArgs {
            config: Some(file.path().to_path_buf()),
            log: Some(PathBuf::from("/tmp/Fleet_20261019_120000.txt")),
        };
        let config = KosConfig::load_from(cli).expect("config should load");
        assert_eq!(
            config.log_path,
            Some(PathBuf::from("/tmp/Fleet_20261019_120000.txt"))
        );
        assert!(config.log_dir.is_none());
    }
}
