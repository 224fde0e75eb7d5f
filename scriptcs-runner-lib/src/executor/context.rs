use std::collections::HashMap;
use std::error::Error as StdError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Append-only, line-oriented build log.
pub trait LogSink: Send + Sync {
    fn line(&self, line: &str);

    /// Writes a fatal entry followed by the error and each of its causes.
    fn fatal_error(&self, message: &str, error: &(dyn StdError + 'static)) {
        self.line(&format!("FATAL: {message}"));
        self.line(&error.to_string());
        let mut source = error.source();
        while let Some(cause) = source {
            self.line(&format!("Caused by: {cause}"));
            source = cause.source();
        }
    }
}

/// Writes build output to the process's stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not abort the build.
        let _ = writeln!(stdout, "{line}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// What the host hands to a single step execution.
#[derive(Clone)]
pub struct RunContext {
    working_dir: PathBuf,
    env: HashMap<String, String>,
    sink: Arc<dyn LogSink>,
}

impl RunContext {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        env: HashMap<String, String>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            env,
            sink,
        }
    }

    /// Inherits the environment and working directory of this process.
    pub fn from_env(sink: Arc<dyn LogSink>) -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?, std::env::vars().collect(), sink))
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = path.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// The module root the step runs in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn environment(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("working_dir", &self.working_dir)
            .field("env", &self.env.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_fatal_error_writes_cause_chain() {
        let sink = MemorySink::new();
        let error = Outer(std::io::Error::new(std::io::ErrorKind::NotFound, "inner"));

        sink.fatal_error("command execution failed", &error);

        assert_eq!(
            sink.lines(),
            vec![
                "FATAL: command execution failed".to_string(),
                "outer".to_string(),
                "Caused by: inner".to_string(),
            ]
        );
    }

    #[test]
    fn test_context_builders() {
        let sink = Arc::new(MemorySink::new());
        let ctx = RunContext::new("/work", HashMap::new(), sink)
            .with_env("BUILD_NUMBER", "7")
            .with_working_dir("/work/module");

        assert_eq!(ctx.working_dir(), Path::new("/work/module"));
        assert_eq!(ctx.environment().get("BUILD_NUMBER").map(String::as_str), Some("7"));
    }
}
