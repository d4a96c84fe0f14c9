//! JSON blob store
//!
//! One pretty-printed file per named blob, `{root}/{name}.json`. Every write
//! replaces the whole file.

use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;

use crate::error::{ClientError, Result};

/// Directory-backed store of named JSON blobs.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File path of blob `name`.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Serialize `value` into blob `name`, replacing any previous content.
    pub async fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value).map_err(|e| storage_error(name, e))?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| storage_error(name, e))?;
        let path = self.path_of(name);
        fs::write(&path, content)
            .await
            .map_err(|e| storage_error(name, e))?;

        log::info!("[store] Wrote {}", path.display());
        Ok(())
    }

    /// Read blob `name` back.
    ///
    /// # Errors
    /// - [`ClientError::StorageError`] when the file cannot be read
    /// - [`ClientError::ParseError`] when its content does not deserialize
    pub async fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path_of(name);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| storage_error(name, e))?;

        serde_json::from_str(&content).map_err(|e| ClientError::ParseError {
            detail: format!("{}: {e}", path.display()),
        })
    }

    pub async fn exists(&self, name: &str) -> bool {
        fs::try_exists(self.path_of(name)).await.unwrap_or(false)
    }
}

fn storage_error(name: &str, e: impl std::fmt::Display) -> ClientError {
    ClientError::StorageError {
        name: name.to_string(),
        detail: e.to_string(),
    }
}
