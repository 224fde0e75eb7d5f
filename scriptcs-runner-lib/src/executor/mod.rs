pub mod context;
pub mod launcher;
pub mod runner;
pub mod script;

pub use context::{ConsoleSink, LogSink, MemorySink, RunContext};
pub use launcher::{LaunchError, LaunchRequest, Launcher, ProcessLauncher};
pub use runner::{build_arguments, command_line, Executor, StepError};
pub use script::TempScript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    BuildFailed = 1,
    CliUsageError = 64,
    InternalError = 70,
    ConfigError = 78,
}

impl ExitCode {
    pub fn from_outcome(passed: bool) -> Self {
        if passed {
            Self::Success
        } else {
            Self::BuildFailed
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
