//! Delivery of finished export files.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::info;
use tempfile::NamedTempFile;

use crate::error::ExportError;

/// Accepts a complete file. Sinks are only called once every byte exists.
pub trait DownloadSink: Send + Sync {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Writes files into a directory through a temp file renamed into place, so
/// a failed write never leaves a partial file under the final name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| ExportError::Encode(format!("invalid file name `{file_name}`")))?;
        std::fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(name);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| ExportError::Io(e.error))?;

        info!("wrote {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }
}

/// Keeps files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(file_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| ExportError::Encode("memory sink poisoned".to_string()))?;
        files.insert(file_name.to_string(), bytes.to_vec());
        Ok(PathBuf::from(file_name))
    }
}
