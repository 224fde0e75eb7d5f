use anyhow::{anyhow, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Key the executable path is stored and submitted under.
pub const EXECUTABLE_KEY: &str = "scriptcsexe";

/// Environment variable that overrides the stored executable path.
pub const EXECUTABLE_ENV: &str = "SCRIPTCS_EXE";

/// Installation-wide settings shared by every ScriptCS build step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GlobalSettings {
    #[serde(rename = "scriptcsexe", default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
}

impl GlobalSettings {
    pub fn new(executable_path: impl Into<String>) -> Self {
        Self {
            executable_path: Some(executable_path.into()),
        }
    }

    /// The configured interpreter path, if one is set and not blank.
    pub fn executable(&self) -> Option<&str> {
        self.executable_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
    }

    /// Builds settings from a submitted configuration form.
    pub fn from_form(form: &serde_json::Value) -> Result<Self> {
        let value = form
            .get(EXECUTABLE_KEY)
            .ok_or_else(|| anyhow!("form is missing the '{EXECUTABLE_KEY}' field"))?;
        let path = value
            .as_str()
            .ok_or_else(|| anyhow!("form field '{EXECUTABLE_KEY}' must be a string"))?;
        Ok(Self::new(path))
    }

    fn with_override(mut self, value: Option<String>) -> Self {
        if let Some(path) = value.filter(|v| !v.trim().is_empty()) {
            self.executable_path = Some(path);
        }
        self
    }
}

/// File-backed store for [`GlobalSettings`].
///
/// Loaded once when opened; later changes on disk are only picked up by an
/// explicit [`SettingsStore::reload`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    current: GlobalSettings,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let current = Self::load_from_file(&path)?;
        tracing::debug!(path = %path.display(), "loaded global settings");
        Ok(Self { path, current })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("scriptcs-runner").join("settings.toml"))
        } else if let Some(home) = dirs::home_dir() {
            Ok(home.join(".config").join("scriptcs-runner").join("settings.toml"))
        } else {
            Err(anyhow!("Cannot determine configuration directory"))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings as a run should see them, environment override included.
    pub fn get(&self) -> GlobalSettings {
        self.current
            .clone()
            .with_override(std::env::var(EXECUTABLE_ENV).ok())
    }

    pub fn reload(&mut self) -> Result<GlobalSettings> {
        self.current = Self::load_from_file(&self.path)?;
        Ok(self.get())
    }

    pub fn save(&mut self, settings: GlobalSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(&settings)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "saved global settings");

        self.current = settings;
        Ok(())
    }

    /// Applies an administrator form submission and persists it.
    pub fn configure(&mut self, form: &serde_json::Value) -> Result<()> {
        let settings = GlobalSettings::from_form(form)?;
        self.save(settings)
    }

    fn load_from_file(path: &Path) -> Result<GlobalSettings> {
        if !path.exists() {
            return Ok(GlobalSettings::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings: GlobalSettings = toml::from_str(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        Ok(settings)
    }
}
