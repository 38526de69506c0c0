//! Local filesystem output store.
//!
//! Every write lands at a fresh UUID-named path under the configured root,
//! so a redelivered task that does write again can never clobber an
//! earlier output.

use std::path::{Path, PathBuf};

/// Writes processed images to a directory, one fresh file per write.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` to a fresh `{uuid}.jpg` under the root.
    ///
    /// Creates the root directory on first use. Returns the output
    /// reference (the path as a string) recorded on the item.
    pub async fn write(&self, bytes: &[u8]) -> Result<String, std::io::Error> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(format!("{}.jpg", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, bytes).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}
