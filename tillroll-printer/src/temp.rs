//! Transient file lifecycle
//!
//! Print attempts that go through a PDF intermediate need a file on disk
//! for the lifetime of one submission. [`TempResourceTracker`] owns that
//! lifecycle: scoped use deletes on every exit path (the backing
//! `NamedTempFile` guard deletes on drop, so an early `?` or a panic
//! cannot leak the file); deferred use keeps the file alive for a grace
//! period so an external viewer can open it first.

use crate::error::{PrintError, PrintResult};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Audit record for one transient artifact
#[derive(Debug, Clone)]
pub struct TempArtifact {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// Id of the print request that owns this artifact
    pub owner: String,
}

/// Creates and cleans up transient files
#[derive(Debug, Clone)]
pub struct TempResourceTracker {
    dir: PathBuf,
}

impl Default for TempResourceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TempResourceTracker {
    /// Track files in the OS temp directory
    pub fn new() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }

    /// Track files in a specific directory (tests)
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn create_file(
        &self,
        owner: &str,
        extension: &str,
        content: &[u8],
    ) -> PrintResult<(tempfile::NamedTempFile, TempArtifact)> {
        let created_at = Utc::now();
        // Timestamp keeps concurrent requests from colliding even before
        // the random suffix does
        let prefix = format!("tillroll-{}-", created_at.timestamp_millis());

        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&format!(".{}", extension))
            .tempfile_in(&self.dir)?;
        file.write_all(content)?;
        file.flush()?;

        let artifact = TempArtifact {
            path: file.path().to_path_buf(),
            created_at,
            owner: owner.to_string(),
        };
        debug!(path = %artifact.path.display(), owner, "temp artifact created");
        Ok((file, artifact))
    }

    /// Scoped temp file: create, run `f` on the path, delete
    ///
    /// Deletion happens on every exit path, including an error from `f`.
    #[instrument(skip(self, content, f))]
    pub async fn with_temp_file<T, Fut, F>(
        &self,
        owner: &str,
        extension: &str,
        content: &[u8],
        f: F,
    ) -> PrintResult<T>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = PrintResult<T>>,
    {
        let (file, artifact) = self.create_file(owner, extension, content)?;
        let result = f(artifact.path.clone()).await;

        // Explicit close surfaces deletion errors that a plain drop would
        // swallow; the file is gone either way
        if let Err(e) = file.close() {
            warn!(path = %artifact.path.display(), error = %e, "temp file deletion failed");
        } else {
            debug!(path = %artifact.path.display(), owner, "temp artifact deleted");
        }
        result
    }

    /// Deferred temp file: create, return the path, delete after `grace`
    ///
    /// For the external-viewer path, where the file must outlive the
    /// request long enough for the viewer process to open it.
    #[instrument(skip(self, content), fields(grace_secs = grace.as_secs()))]
    pub async fn write_deferred(
        &self,
        owner: &str,
        extension: &str,
        content: &[u8],
        grace: Duration,
    ) -> PrintResult<PathBuf> {
        let (file, artifact) = self.create_file(owner, extension, content)?;
        let (_handle, path) = file
            .keep()
            .map_err(|e| PrintError::Io(e.error))?;

        let cleanup_path = path.clone();
        let owner = owner.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            match tokio::fs::remove_file(&cleanup_path).await {
                Ok(()) => debug!(path = %cleanup_path.display(), owner, "deferred temp artifact deleted"),
                Err(e) => warn!(path = %cleanup_path.display(), error = %e, "deferred temp deletion failed"),
            }
        });

        Ok(path)
    }

    /// Directory this tracker creates files in
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scoped_file_deleted_after_use() {
        let tracker = TempResourceTracker::new();
        let mut seen_path = PathBuf::new();

        let result = tracker
            .with_temp_file("req-1", "pdf", b"%PDF-1.7", |path| {
                seen_path = path.clone();
                async move {
                    assert!(path.exists());
                    Ok(42)
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert!(!seen_path.exists());
    }

    #[tokio::test]
    async fn test_scoped_file_deleted_on_error() {
        let tracker = TempResourceTracker::new();
        let mut seen_path = PathBuf::new();

        let result: PrintResult<()> = tracker
            .with_temp_file("req-2", "pdf", b"%PDF-1.7", |path| {
                seen_path = path.clone();
                async move { Err(PrintError::Spooler("simulated".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert!(!seen_path.exists());
    }

    #[tokio::test]
    async fn test_deferred_file_survives_return_then_deletes() {
        let tracker = TempResourceTracker::new();
        let path = tracker
            .write_deferred("req-3", "pdf", b"%PDF-1.7", Duration::from_millis(50))
            .await
            .unwrap();

        assert!(path.exists());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unique_paths_for_same_owner() {
        let tracker = TempResourceTracker::new();
        let a = tracker
            .write_deferred("req-4", "pdf", b"a", Duration::from_secs(5))
            .await
            .unwrap();
        let b = tracker
            .write_deferred("req-4", "pdf", b"b", Duration::from_secs(5))
            .await
            .unwrap();
        assert_ne!(a, b);
        // Cleanup without waiting for the grace period
        let _ = std::fs::remove_file(a);
        let _ = std::fs::remove_file(b);
    }
}
