use std::path::PathBuf;

use pagewatch_core::Toggles;
use pagewatch_engine::AtomicFileWriter;
use pagewatch_logging::{watch_info, watch_warn};
use serde::{Deserialize, Serialize};

use super::settings::ConfigError;

pub const TOGGLES_FILENAME: &str = "toggles.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
struct PersistedToggles {
    #[serde(rename = "keepAliveEnabled")]
    keep_alive_enabled: bool,
    #[serde(rename = "statusAlertEnabled")]
    status_alert_enabled: bool,
}

/// Durable storage for the feature toggles.
pub struct ToggleStore {
    writer: AtomicFileWriter,
}

impl ToggleStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(state_dir),
        }
    }

    /// Unreadable or malformed state counts as "everything off".
    pub fn load(&self) -> Toggles {
        let content = match self.writer.read(TOGGLES_FILENAME) {
            Ok(Some(content)) => content,
            Ok(None) => return Toggles::default(),
            Err(err) => {
                watch_warn!(
                    "Failed to read toggles from {:?}: {}",
                    self.writer.dir(),
                    err
                );
                return Toggles::default();
            }
        };

        match ron::from_str::<PersistedToggles>(&content) {
            Ok(persisted) => {
                let toggles = Toggles {
                    keep_alive: persisted.keep_alive_enabled,
                    status_alert: persisted.status_alert_enabled,
                };
                watch_info!("Loaded toggles {:?}", toggles);
                toggles
            }
            Err(err) => {
                watch_warn!("Failed to parse persisted toggles: {}", err);
                Toggles::default()
            }
        }
    }

    pub fn save(&self, toggles: Toggles) -> Result<PathBuf, ConfigError> {
        let persisted = PersistedToggles {
            keep_alive_enabled: toggles.keep_alive,
            status_alert_enabled: toggles.status_alert,
        };
        let content = ron::ser::to_string_pretty(&persisted, ron::ser::PrettyConfig::new())?;
        Ok(self.writer.write(TOGGLES_FILENAME, &content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn fresh_state_dir_loads_all_off() {
        let temp = TempDir::new().unwrap();
        let store = ToggleStore::new(temp.path().join("state"));
        assert_eq!(store.load(), Toggles::default());
    }

    #[test]
    fn saved_toggles_survive_a_new_store() {
        let temp = TempDir::new().unwrap();
        let toggles = Toggles {
            keep_alive: true,
            status_alert: false,
        };
        ToggleStore::new(temp.path().to_path_buf())
            .save(toggles)
            .unwrap();

        let content = fs::read_to_string(temp.path().join(TOGGLES_FILENAME)).unwrap();
        assert!(content.contains("keepAliveEnabled: true"));
        assert_eq!(ToggleStore::new(temp.path().to_path_buf()).load(), toggles);
    }

    #[test]
    fn garbage_file_loads_all_off() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(TOGGLES_FILENAME), "not ron at all {").unwrap();
        assert_eq!(
            ToggleStore::new(temp.path().to_path_buf()).load(),
            Toggles::default()
        );
    }
}
