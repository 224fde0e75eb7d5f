use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of a single ScriptCS build step.
///
/// Field names on disk follow the job configuration keys the step has always
/// used, so existing job files keep loading. Missing keys read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StepConfig {
    #[serde(rename = "scriptfile")]
    pub script_file: String,

    pub arguments: String,

    #[serde(rename = "customScript")]
    pub custom_script: String,
}

/// Where the script handed to the interpreter comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSource<'a> {
    /// Script body written inline in the job configuration.
    Inline(&'a str),
    /// Path to a script file, passed through verbatim.
    File(&'a str),
}

impl StepConfig {
    pub fn new(
        script_file: impl Into<String>,
        arguments: impl Into<String>,
        custom_script: impl Into<String>,
    ) -> Self {
        Self {
            script_file: script_file.into(),
            arguments: arguments.into(),
            custom_script: custom_script.into(),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid job file {}", path.display()))?;
        Ok(config)
    }

    /// An inline script wins over the script file whenever it is not blank.
    pub fn source(&self) -> ScriptSource<'_> {
        if is_blank(&self.custom_script) {
            ScriptSource::File(&self.script_file)
        } else {
            ScriptSource::Inline(&self.custom_script)
        }
    }

    /// The trailing argument string, untouched, or `None` when blank.
    pub fn trailing_arguments(&self) -> Option<&str> {
        if is_blank(&self.arguments) {
            None
        } else {
            Some(&self.arguments)
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_script_takes_precedence() {
        let config = StepConfig::new("build.csx", "", "print(1)");
        assert_eq!(config.source(), ScriptSource::Inline("print(1)"));
    }

    #[test]
    fn test_blank_custom_script_falls_back_to_file() {
        let config = StepConfig::new("build.csx", "", "  \n\t");
        assert_eq!(config.source(), ScriptSource::File("build.csx"));
    }

    #[test]
    fn test_trailing_arguments_kept_literally() {
        let config = StepConfig::new("build.csx", " -a  -b ", "");
        assert_eq!(config.trailing_arguments(), Some(" -a  -b "));

        let blank = StepConfig::new("build.csx", "   ", "");
        assert_eq!(blank.trailing_arguments(), None);
    }

    #[test]
    fn test_load_job_file_with_missing_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("job.toml");
        std::fs::write(&path, "customScript = \"\"\"\nprint(1)\n\"\"\"\n").unwrap();

        let config = StepConfig::load_from_file(&path).unwrap();
        assert_eq!(config.script_file, "");
        assert_eq!(config.arguments, "");
        assert_eq!(config.custom_script, "print(1)\n");
    }

    #[test]
    fn test_load_job_file_uses_stored_key_names() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("job.toml");
        std::fs::write(&path, "scriptfile = \"build.csx\"\narguments = \"--verbose\"\n").unwrap();

        let config = StepConfig::load_from_file(&path).unwrap();
        assert_eq!(config, StepConfig::new("build.csx", "--verbose", ""));
    }
}
