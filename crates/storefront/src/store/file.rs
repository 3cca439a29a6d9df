use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DurableStore, StoreError};

/// File-backed store holding every key in one JSON object.
///
/// A missing file reads as an empty store. Each write lands in its own
/// uniquely named sibling temp file that is then renamed over the original,
/// so readers see either the old or the new document and never a partial one,
/// even with several processes writing the same file. Concurrent writers in
/// different processes may still overwrite each other's keys (last rename
/// wins).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Move an unreadable document aside to `<file>.corrupt` so the store
    /// starts empty. Returns where the document went.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    pub async fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let _guard = self.write_lock.lock().await;

        let target = self.sibling(".corrupt");
        tokio::fs::rename(&self.path, &target).await?;
        tracing::warn!(
            path = %self.path.display(),
            moved_to = %target.display(),
            "Moved corrupt store document aside"
        );
        Ok(target)
    }

    async fn read_document(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
                path: self.path.display().to_string(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let text = serde_json::to_string_pretty(document).map_err(StoreError::Encode)?;
        let temp_path = self.sibling(&format!(".{}.tmp", Uuid::new_v4()));

        let result = self.replace_with(&temp_path, text.as_bytes()).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        result
    }

    async fn replace_with(&self, temp_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut file = tokio::fs::File::create(temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(temp_path, &self.path).await?;
        Ok(())
    }

    /// `<dir>/<file><suffix>` next to the document.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("store"), OsString::from);
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_document().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // Read-modify-write of the whole document; other keys must survive.
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        document.insert(key.to_string(), value.to_string());
        self.write_document(&document).await?;

        tracing::debug!(path = %self.path.display(), key, "Store entry written");
        Ok(())
    }
}
