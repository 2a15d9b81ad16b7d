//! Daemon settings, read from `pagewatch.ron`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use log::LevelFilter;
use pagewatch_core::{AddressPattern, DEFAULT_ADDRESS_PATTERN};
use pagewatch_engine::{
    DevToolsSettings, EngineConfig, LoopTimings, PersistError, SinkSettings,
    DEFAULT_DEVTOOLS_URL, DEFAULT_SINK_URL,
};
use pagewatch_logging::{watch_info, watch_warn, LogDestination};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILENAME: &str = "pagewatch.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no home directory to derive config and state directories from")]
    NoProjectDirs,
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("failed to encode: {0}")]
    Encode(#[from] ron::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOutput {
    File,
    Terminal,
    #[default]
    Both,
}

impl From<LogOutput> for LogDestination {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::File => LogDestination::File,
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub devtools_url: String,
    pub sink_url: String,
    pub address_pattern: String,
    pub host_poll_interval_ms: u64,
    pub count_interval_ms: u64,
    pub presence_interval_ms: u64,
    pub keep_alive_min_ms: u64,
    pub keep_alive_max_ms: u64,
    /// Toggles and the log file live here. Defaults to the platform data dir.
    pub state_dir: Option<PathBuf>,
    pub log_destination: LogOutput,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            devtools_url: DEFAULT_DEVTOOLS_URL.to_string(),
            sink_url: DEFAULT_SINK_URL.to_string(),
            address_pattern: DEFAULT_ADDRESS_PATTERN.to_string(),
            host_poll_interval_ms: 3_000,
            count_interval_ms: 2_000,
            presence_interval_ms: 5_000,
            keep_alive_min_ms: 10_000,
            keep_alive_max_ms: 30_000,
            state_dir: None,
            log_destination: LogOutput::Both,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn pattern(&self) -> AddressPattern {
        AddressPattern::new(&self.address_pattern)
    }

    /// Unknown level names fall back to `Info`.
    pub fn level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            devtools: DevToolsSettings {
                base_url: self.devtools_url.clone(),
                ..DevToolsSettings::default()
            },
            sink: SinkSettings {
                url: self.sink_url.clone(),
                ..SinkSettings::default()
            },
            timings: LoopTimings {
                count_interval: Duration::from_millis(self.count_interval_ms),
                presence_interval: Duration::from_millis(self.presence_interval_ms),
                keep_alive_delay_ms: self.keep_alive_min_ms..self.keep_alive_max_ms,
            },
            host_poll_interval: Duration::from_millis(self.host_poll_interval_ms),
            ..EngineConfig::default()
        }
    }
}

/// Settings plus the directories derived from them.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: Settings,
    pub state_dir: PathBuf,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "pagewatch", "Pagewatch")
}

/// Reads settings from `explicit`, or from the platform config directory.
pub fn load_settings(explicit: Option<&Path>) -> Result<ResolvedSettings, ConfigError> {
    let dirs = project_dirs();
    let path = match (explicit, &dirs) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(dirs)) => Some(dirs.config_dir().join(SETTINGS_FILENAME)),
        (None, None) => None,
    };

    let settings = match &path {
        Some(path) => read_settings(path)?,
        None => Settings::default(),
    };
    let state_dir = match (&settings.state_dir, &dirs) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dirs)) => dirs.data_dir().to_path_buf(),
        (None, None) => return Err(ConfigError::NoProjectDirs),
    };

    Ok(ResolvedSettings {
        settings,
        state_dir,
    })
}

/// A missing file yields the defaults.
pub fn read_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            watch_info!("No settings at {:?}; using defaults", path);
            return Ok(Settings::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let settings: Settings = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if settings.keep_alive_min_ms >= settings.keep_alive_max_ms {
        watch_warn!(
            "keep_alive_min_ms ({}) is not below keep_alive_max_ms ({}); the minimum is used",
            settings.keep_alive_min_ms,
            settings.keep_alive_max_ms
        );
    }
    Ok(settings)
}
