//! The partition store: an append-only, newline-delimited log per
//! partition, held in memory on the owner and mirrored to disk. Ported from
//! `internal/broker/storage.go` (`LoadPartitionLog` / `AppendPartitionLog`).
//!
//! Layout is fixed to the plain log format (spec.md §6, §9): the gzip
//! variant mentioned in the original drafts never appears in the retained
//! source, so there's nothing to port and no ambiguity to preserve.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

#[derive(Clone)]
pub struct PartitionStore {
    data_dir: PathBuf,
}

impl PartitionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn log_path(&self, topic: &str, partition: u32) -> PathBuf {
        self.data_dir.join(format!("{topic}_{partition}.log"))
    }

    /// Reads a partition's log back into memory. A missing file means an
    /// empty, never-written partition, not an error.
    pub fn recover(&self, topic: &str, partition: u32) -> std::io::Result<Vec<String>> {
        let path = self.log_path(topic, partition);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.lines().map(str::to_string).collect())
    }

    /// Appends a single line to the on-disk log. Failures here are logged
    /// by the caller but never roll back the in-memory offset that's
    /// already been assigned (spec.md §5, §7: liveness over durability).
    pub async fn append(
        &self,
        topic: &str,
        partition: u32,
        message: &str,
    ) -> std::io::Result<()> {
        let path = self.log_path(topic, partition);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(message.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
