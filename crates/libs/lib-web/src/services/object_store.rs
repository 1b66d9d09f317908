//! # Object Store
//!
//! Attachments are written once under a key of the form
//! `{connection_id}/{millis}-{suffix}.{ext}` and served back read-only from
//! `GET /attachments/{key}`.
//!
//! [`LocalObjectStore`] keeps objects on the local filesystem. Other backends
//! implement [`ObjectStore`].

use async_trait::async_trait;
use lib_utils::time::timestamp_millis;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing nothing: keys are generated unique.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError>;
}

/// Filesystem-backed store rooted at a directory.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), ObjectStoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!("[STORE] wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Build a fresh key for an attachment of `connection_id`.
///
/// The extension of the original file name is kept (lowercased, alphanumeric only)
/// so the served file gets a sensible content type.
pub fn attachment_key(connection_id: i64, file_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];

    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}/{}-{}.{}", connection_id, timestamp_millis(), suffix, ext),
        None => format!("{}/{}-{}", connection_id, timestamp_millis(), suffix),
    }
}

/// Public download URL for `key`.
pub fn public_url(public_base_url: &str, key: &str) -> String {
    format!("{}/attachments/{}", public_base_url.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("7/123-abc.png", b"png-bytes").await.unwrap();

        let stored = tokio::fs::read(dir.path().join("7").join("123-abc.png")).await.unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        for key in ["../secret", "/etc/passwd", "7/../../x", ""] {
            assert!(
                matches!(store.put(key, b"x").await, Err(ObjectStoreError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_attachment_key_shape() {
        let key = attachment_key(42, "Report.Final.PDF");
        assert!(key.starts_with("42/"));
        assert!(key.ends_with(".pdf"));

        let key = attachment_key(42, "no-extension");
        assert!(!key.contains('.'));

        let key = attachment_key(42, "weird.ex/t");
        assert!(key.starts_with("42/"));
        assert_eq!(key.matches('/').count(), 1);
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("http://localhost:3001/", "4/1-a.png"),
            "http://localhost:3001/attachments/4/1-a.png"
        );
    }
}
