use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::materialize::INDEX_FILE;

/// Mode of a committed page, readable by a web server running as another user.
#[cfg(unix)]
pub const INDEX_FILE_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes `{dir}/index.html` by streaming into a temp file in `dir` and
/// renaming it into place once the body is complete.
pub struct IndexFileWriter {
    dir: PathBuf,
}

impl IndexFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn target(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn begin(&self) -> Result<PendingIndexFile, PersistError> {
        if !self.dir.is_dir() {
            return Err(PersistError::OutputDir(self.dir.display().to_string()));
        }
        let (file, temp) = Builder::new()
            .prefix(".index-")
            .tempfile_in(&self.dir)?
            .into_parts();
        // Temp files start out owner-only; the persisted page keeps this mode.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(INDEX_FILE_MODE))?;
        }
        Ok(PendingIndexFile {
            file: tokio::fs::File::from_std(file),
            temp,
            target: self.target(),
            written: 0,
        })
    }
}

/// An in-progress `index.html`. Dropping it without [`commit`](Self::commit)
/// removes the temp file, so no partial page is ever visible.
pub struct PendingIndexFile {
    file: tokio::fs::File,
    temp: TempPath,
    target: PathBuf,
    written: u64,
}

impl PendingIndexFile {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Flushes and moves the file into place, returning bytes written.
    pub async fn commit(self) -> Result<u64, PersistError> {
        let Self {
            mut file,
            temp,
            target,
            written,
        } = self;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        temp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(written)
    }
}
