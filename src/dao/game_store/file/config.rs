use std::path::PathBuf;

use directories::ProjectDirs;

use super::error::{FileDaoError, FileResult};

/// Where the file store keeps its JSON documents.
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Directory holding the record files.
    pub dir: PathBuf,
}

impl FileStoreConfig {
    /// Use an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read `QUIZ_DATA_DIR`, falling back to the per-user data directory of the platform.
    pub fn from_env() -> FileResult<Self> {
        if let Ok(dir) = std::env::var("QUIZ_DATA_DIR") {
            return Ok(Self::new(dir));
        }
        ProjectDirs::from("org", "neon", "neon-quiz")
            .map(|dirs| Self::new(dirs.data_dir()))
            .ok_or(FileDaoError::NoDataDirectory)
    }
}
