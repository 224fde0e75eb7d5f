pub mod config;
pub mod executor;
pub mod logging;
pub mod step;
pub mod validation;

pub use config::{GlobalSettings, SettingsStore};
pub use executor::{ExitCode, Executor, RunContext};
pub use step::{ScriptSource, StepConfig};
pub use validation::{check_name, FormValidation};

use anyhow::Result;
use std::path::PathBuf;

/// Name the build step is shown under.
pub const DISPLAY_NAME: &str = "ScriptCS Runner";

#[derive(Debug, Clone)]
pub struct Context {
    pub settings: SettingsStore,
}

impl Context {
    pub fn new(settings_path: Option<PathBuf>) -> Result<Self> {
        let settings = match settings_path {
            Some(path) => SettingsStore::open(path)?,
            None => SettingsStore::open_default()?,
        };

        Ok(Self { settings })
    }
}
