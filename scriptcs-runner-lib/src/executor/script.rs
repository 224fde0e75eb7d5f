use std::io::{self, Write};
use std::path::Path;
use tempfile::TempPath;

pub const TEMP_SCRIPT_PREFIX: &str = "ScriptCS_";
pub const SCRIPT_EXTENSION: &str = ".csx";

/// An inline script materialized on disk for one execution.
///
/// The file is closed once written so the interpreter can open it on any
/// platform, and removed when this value is dropped. Removal errors are
/// ignored.
#[derive(Debug)]
pub struct TempScript {
    path: TempPath,
}

impl TempScript {
    /// Writes `content` to a new file in the platform temp directory.
    pub fn create(content: &str) -> io::Result<Self> {
        Self::create_in(&std::env::temp_dir(), content)
    }

    pub fn create_in(dir: &Path, content: &str) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_SCRIPT_PREFIX)
            .suffix(SCRIPT_EXTENSION)
            .tempfile_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path();
        tracing::debug!(path = %path.display(), "wrote custom script");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
