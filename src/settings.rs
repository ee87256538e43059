// WHY: the single user-visible setting and where it persists
// A missing or unreadable settings file must never stop the engine from starting

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Default settings file, relative to the working directory
pub const DEFAULT_SETTINGS_FILE: &str = ".ospl.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Format automatically after edits settle
    pub auto_format: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { auto_format: true }
    }
}

/// Persistent settings backend
pub trait SettingsStore {
    fn load(&self) -> impl Future<Output = Result<Settings>>;

    fn save(&self, settings: &Settings) -> impl Future<Output = Result<()>>;
}

/// Settings kept as a small JSON object on disk
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> Result<Settings> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read settings from {}", self.path.display()));
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt settings file");
                Ok(Settings::default())
            }
        }
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create settings directory {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        debug!(path = %self.path.display(), ?settings, "Settings saved");
        Ok(())
    }
}

/// In-process store; saves can be made to fail
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RefCell<Settings>,
    fail_saves: Cell<bool>,
    saves: Cell<usize>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RefCell::new(settings),
            ..Self::default()
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    /// Last successfully saved value
    pub fn stored(&self) -> Settings {
        *self.settings.borrow()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.stored())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        if self.fail_saves.get() {
            bail!("settings store is read-only");
        }
        *self.settings.borrow_mut() = *settings;
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
