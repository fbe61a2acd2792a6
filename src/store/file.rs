//! Filesystem destination: `<base>/<source_account>/<file_name>`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::Store;
use crate::error::{Error, Result};
use crate::types::Item;
use crate::utils::sanitize_filename;

/// Base directory used when a file destination names none
pub const DEFAULT_BASE_PATH: &str = "./download";

/// Directory name used when an account sanitizes to nothing
const UNNAMED_ACCOUNT_DIR: &str = "_";

/// Writes items under a base directory, one sub-directory per source account
#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
    id: String,
}

impl FileStore {
    /// Create the store, making `base_path` absolute and creating it
    ///
    /// When `clean_on_start` is set, the existing tree is removed first.
    pub async fn new(base_path: &Path, clean_on_start: bool) -> Result<Self> {
        let base_path = if base_path.as_os_str().is_empty() {
            Path::new(DEFAULT_BASE_PATH)
        } else {
            base_path
        };
        let base_path = std::path::absolute(base_path)?;
        let id = base_path.to_string_lossy().into_owned();
        tracing::info!(path = %id, "File store initialized");

        let store = Self { base_path, id };

        if clean_on_start {
            // Missing directories are fine; anything else is only worth a warning
            if let Err(e) = store.clean_all(&store.id).await {
                tracing::warn!(path = %store.id, error = %e, "Failed to clean file store on start");
            }
        }
        store.create_dir(&store.id).await?;

        Ok(store)
    }

    /// Absolute base directory
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Per-account directory; always a direct child of the base
    fn account_dir(&self, account: &str) -> PathBuf {
        let name = sanitize_filename(account);
        if name.is_empty() {
            self.base_path.join(UNNAMED_ACCOUNT_DIR)
        } else {
            self.base_path.join(name)
        }
    }

    /// Where `write` puts the item and where `item_exists` looks for it
    fn item_path(&self, item: &Item) -> PathBuf {
        let file_name = match Path::new(&item.file_name).file_name() {
            Some(name) if name == item.file_name.as_str() => item.file_name.clone(),
            _ => sanitize_filename(&item.file_name),
        };
        self.account_dir(&item.source_account).join(file_name)
    }
}

#[async_trait]
impl Store for FileStore {
    async fn write(&self, item: &Item) -> Result<String> {
        let data = item.data.as_deref().ok_or_else(|| Error::StoreWriteFailed {
            store: self.id.clone(),
            file_name: item.file_name.clone(),
            reason: "item has no payload".to_string(),
        })?;

        let path = self.item_path(item);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        Ok(path.to_string_lossy().into_owned())
    }

    async fn item_exists(&self, item: &Item) -> bool {
        tokio::fs::try_exists(self.item_path(item))
            .await
            .unwrap_or(false)
    }

    fn item_dst_path(&self, item: &Item) -> String {
        self.account_dir(&item.source_account)
            .to_string_lossy()
            .into_owned()
    }

    async fn create_dir(&self, path: &str) -> Result<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn clean_all(&self, path: &str) -> Result<()> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => {
                tracing::info!(path, "Cleanup success");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}
