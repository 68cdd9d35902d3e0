//! Request-scoped temporary files
//!
//! Every file the pipeline writes to disk is owned by a [`ScopedFile`]. The
//! guard is created before the file itself, so whichever way the owning
//! request exits (normal return, `?`, a dropped future on client disconnect)
//! the file is removed when the guard goes out of scope.

use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Staging errors
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Staging I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Upload stream failed: {0}")]
    Source(Box<dyn StdError + Send + Sync>),
}

/// An owned path on disk, deleted when dropped
#[derive(Debug)]
pub struct ScopedFile {
    path: PathBuf,
}

impl ScopedFile {
    /// Take ownership of `path`. The file does not have to exist yet.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Removal is a synchronous `std::fs::remove_file`: a single unlink, run on
/// whichever thread drops the guard, including runtime workers.
impl Drop for ScopedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(
                    stage = "cleaned",
                    path = %self.path.display(),
                    "Temporary file removed"
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove temporary file"
                );
            }
        }
    }
}

/// An uploaded image waiting in the staging directory
#[derive(Debug)]
pub struct StagedUpload {
    pub file: ScopedFile,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Directory that receives uploaded files
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Claim a fresh, unique path inside the staging directory
    pub fn reserve(&self) -> ScopedFile {
        ScopedFile::new(self.dir.join(Uuid::new_v4().simple().to_string()))
    }

    /// Write a byte stream into a new staging file.
    ///
    /// Returns the guard and the number of bytes written. On error the guard
    /// is dropped here and the partial file goes with it.
    pub async fn stage_stream<S, B, E>(&self, stream: S) -> Result<(ScopedFile, u64), StagingError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: StdError + Send + Sync + 'static,
    {
        tokio::fs::create_dir_all(&self.dir).await?;

        let staged = self.reserve();
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staged.path())
            .await?;

        let mut stream = std::pin::pin!(stream);
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StagingError::Source(Box::new(e)))?;
            let bytes = chunk.as_ref();
            file.write_all(bytes).await?;
            written += bytes.len() as u64;
        }
        file.flush().await?;

        Ok((staged, written))
    }
}
