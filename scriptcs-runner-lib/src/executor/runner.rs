use super::context::RunContext;
use super::launcher::{LaunchError, LaunchRequest, Launcher, ProcessLauncher};
use super::script::TempScript;
use crate::config::GlobalSettings;
use crate::step::{ScriptSource, StepConfig};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Token separating interpreter arguments from script arguments.
pub const ARGUMENT_SEPARATOR: &str = "--";

#[derive(Debug, Error)]
pub enum StepError {
    #[error("ScriptCS executable path is not configured")]
    ExecutableNotConfigured,

    #[error("could not write custom script to a temporary file")]
    TempScript(#[source] std::io::Error),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl StepError {
    fn summary(&self) -> &'static str {
        match self {
            Self::ExecutableNotConfigured => "ScriptCS executable is missing",
            Self::TempScript(_) => "custom script could not be prepared",
            Self::Launch(_) => "command execution failed",
        }
    }
}

/// Runs ScriptCS build steps.
pub struct Executor {
    launcher: Arc<dyn Launcher>,
    dry_run: bool,
    temp_dir: Option<PathBuf>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(Arc::new(ProcessLauncher))
    }
}

impl Executor {
    pub fn new(launcher: Arc<dyn Launcher>) -> Self {
        Self {
            launcher,
            dry_run: false,
            temp_dir: None,
        }
    }

    /// Log the command instead of launching it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Directory for inline scripts; the platform temp directory otherwise.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Runs one build step and reports whether it passed.
    ///
    /// Failures never escape: they are written to the build log as fatal
    /// entries and reported as `false`. A temporary script created for the
    /// run is removed before this returns, whichever way the run ended.
    pub async fn execute(
        &self,
        config: &StepConfig,
        settings: &GlobalSettings,
        ctx: &RunContext,
    ) -> bool {
        match self.try_execute(config, settings, ctx).await {
            Ok(passed) => passed,
            Err(e) => {
                tracing::warn!("build step failed: {e}");
                ctx.sink().fatal_error(e.summary(), &e);
                false
            }
        }
    }

    async fn try_execute(
        &self,
        config: &StepConfig,
        settings: &GlobalSettings,
        ctx: &RunContext,
    ) -> Result<bool, StepError> {
        let executable = settings
            .executable()
            .ok_or(StepError::ExecutableNotConfigured)?;

        // Held until the end of this call; dropping it removes the file.
        let temp_script;
        let script_path = match config.source() {
            ScriptSource::Inline(content) => {
                ctx.sink().line("Using custom script");
                temp_script = match &self.temp_dir {
                    Some(dir) => TempScript::create_in(dir, content),
                    None => TempScript::create(content),
                }
                .map_err(StepError::TempScript)?;
                temp_script.path().to_string_lossy().into_owned()
            }
            ScriptSource::File(path) => path.to_string(),
        };

        let argv = build_arguments(executable, &script_path, config.trailing_arguments());
        let display = command_line(&argv);
        tracing::debug!(?argv, "assembled command");

        if self.dry_run {
            ctx.sink().line(&format!("Would execute: {display}"));
            return Ok(true);
        }

        ctx.sink().line(&format!("Executing command: {display}"));

        let request = LaunchRequest {
            argv,
            env: ctx.environment().clone(),
            cwd: ctx.working_dir().to_path_buf(),
        };
        let code = self.launcher.launch(&request, ctx.sink()).await?;

        Ok(code == 0)
    }
}

/// Assembles `executable script [-- arguments]`.
///
/// `arguments` stays a single element; it is never split on whitespace.
pub fn build_arguments(executable: &str, script: &str, arguments: Option<&str>) -> Vec<String> {
    let mut argv = vec![executable.to_string(), script.to_string()];
    if let Some(arguments) = arguments {
        argv.push(ARGUMENT_SEPARATOR.to_string());
        argv.push(arguments.to_string());
    }
    argv
}

/// Human-readable form of `argv` for the build log.
pub fn command_line(argv: &[String]) -> String {
    shell_words::join(argv)
}
