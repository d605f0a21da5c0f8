use std::{
    collections::BTreeMap,
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

type StoredValues = BTreeMap<String, String>;

/// Interface for a persistent string to string mapping. Values survive daemon restarts.
pub trait DedupeStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Writing the same value twice is harmless.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Stores `value` under `key` unless it's already there. Returns `true` when this call wrote
    /// the value. Implementations shared between processes should make this atomic.
    fn claim(&self, key: &str, value: &str) -> impl Future<Output = Result<bool>> + Send {
        async move {
            if self.get(key).await?.as_deref() == Some(value) {
                return Ok(false);
            }
            self.set(key, value).await?;
            Ok(true)
        }
    }
}

/// The main realization of [DedupeStore]. Keeps everything inside a single json object.
pub struct FileDedupeStore {
    path: PathBuf,
}

impl FileDedupeStore {
    pub fn new(path: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    async fn open_for_write(&self) -> Result<File, std::io::Error> {
        File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await
    }

    async fn read_values(path: &Path, file: &mut File) -> Result<StoredValues> {
        file.rewind().await?;
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        if content.trim().is_empty() {
            return Ok(StoredValues::new());
        }
        match serde_json::from_str::<StoredValues>(&content) {
            Ok(v) => Ok(v),
            Err(e) => {
                // Might happen after a write was cut off. Losing keys only means repeated alerts.
                warn!("Dedupe store {path:?} is corrupted, starting from scratch: {e}");
                Ok(StoredValues::new())
            }
        }
    }

    async fn write_values(file: &mut File, values: &StoredValues) -> Result<()> {
        let buffer = serde_json::to_vec_pretty(values)?;
        file.rewind().await?;
        file.set_len(0).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }

    async fn get_inner(&self, key: &str) -> Result<Option<String>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(e)?,
        };
        file.lock_shared()?;
        let result = Self::read_values(&self.path, &mut file).await;
        file.unlock_async().await?;
        Ok(result?.remove(key))
    }

    /// Applies `update` to the stored values while holding an exclusive lock. Values are only
    /// written back when `update` returns `true`.
    async fn modify(&self, update: impl FnOnce(&mut StoredValues) -> bool) -> Result<bool> {
        let mut file = self.open_for_write().await?;
        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::modify_with_file(&self.path, &mut file, update).await;
        file.unlock_async().await?;
        result
    }

    async fn modify_with_file(
        path: &Path,
        file: &mut File,
        update: impl FnOnce(&mut StoredValues) -> bool,
    ) -> Result<bool> {
        let mut values = Self::read_values(path, file).await?;
        if !update(&mut values) {
            return Ok(false);
        }
        Self::write_values(file, &values).await?;
        Ok(true)
    }
}

impl DedupeStore for FileDedupeStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_inner(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Storing {key}");
        self.modify(|values| {
            values.insert(key.to_string(), value.to_string());
            true
        })
        .await?;
        Ok(())
    }

    async fn claim(&self, key: &str, value: &str) -> Result<bool> {
        self.modify(|values| {
            if values.get(key).map(String::as_str) == Some(value) {
                false
            } else {
                values.insert(key.to_string(), value.to_string());
                true
            }
        })
        .await
    }
}
