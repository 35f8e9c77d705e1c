use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::log::LogLevel;
use crate::signaling::protocol::MAX_BODY_LEN;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_GRACE_MS: u64 = 30_000;
pub const DEFAULT_SWEEP_MS: u64 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected `key = value` or `[Section]`")]
    Syntax { line: usize },
    #[error("[{section}] {key} = {value:?}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// INI-style configuration: optional global keys followed by `[Section]`
/// blocks of `key = value` lines. `#` starts a comment line.
#[derive(Debug, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Syntax { line: idx + 1 });
            };
            let key = key.trim().to_string();
            let value = value.trim().trim_matches('"').to_string();

            match &current_section {
                None => {
                    globals.insert(key, value);
                }
                Some(sec) => {
                    sections.entry(sec.clone()).or_default().insert(key, value);
                }
            }
        }
        Ok(Config { globals, sections })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty_or_default<'a>(
        &'a self,
        section: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    fn parsed<T>(&self, section: &'static str, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self
            .get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
        else {
            return Ok(None);
        };
        raw.parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                section,
                key,
                value: raw.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Everything the server binary needs, resolved from a [`Config`] with
/// defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub listen_addr: String,
    pub max_frame_len: usize,
    /// `None` disables liveness reaping.
    pub heartbeat_grace: Option<Duration>,
    pub sweep_interval: Duration,
    pub log_level: LogLevel,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_frame_len: MAX_BODY_LEN,
            heartbeat_grace: Some(Duration::from_millis(DEFAULT_GRACE_MS)),
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_MS),
            log_level: LogLevel::Info,
        }
    }
}

impl ServerSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let listen_addr = config
            .get_non_empty_or_default("Server", "listen_addr", DEFAULT_LISTEN_ADDR)
            .to_string();

        let max_frame_len = config
            .parsed::<usize>("Server", "max_frame_len")?
            .unwrap_or(defaults.max_frame_len);
        if max_frame_len == 0 {
            return Err(ConfigError::InvalidValue {
                section: "Server",
                key: "max_frame_len",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }

        let grace_ms = config
            .parsed::<u64>("Heartbeat", "grace_ms")?
            .unwrap_or(DEFAULT_GRACE_MS);
        let heartbeat_grace = (grace_ms > 0).then(|| Duration::from_millis(grace_ms));

        let sweep_ms = config
            .parsed::<u64>("Heartbeat", "sweep_ms")?
            .unwrap_or(DEFAULT_SWEEP_MS)
            .max(1);

        let log_level = config
            .parsed::<LogLevel>("Logging", "level")?
            .unwrap_or(defaults.log_level);

        Ok(Self {
            listen_addr,
            max_frame_len,
            heartbeat_grace,
            sweep_interval: Duration::from_millis(sweep_ms),
            log_level,
        })
    }
}
