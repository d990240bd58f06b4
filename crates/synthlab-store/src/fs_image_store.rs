//! Filesystem implementation of the `ImageStore` trait.
//!
//! Objects are written under a root directory and served by the HTTP layer
//! from `base_url`. The stored reference is the object name itself.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use synthlab_catalog::repository::ImageStore;
use synthlab_core::error::DomainError;
use tracing::{debug, error};

/// Image storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
    base_url: String,
}

impl FsImageStore {
    /// Creates a store writing under `root` and publishing under `base_url`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// The directory objects are written under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, object_name: &str) -> Result<PathBuf, DomainError> {
        let relative = Path::new(object_name);
        let plain = !object_name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if plain {
            Ok(self.root.join(relative))
        } else {
            Err(DomainError::Validation(format!(
                "invalid object name: {object_name}"
            )))
        }
    }
}

fn io_error(operation: &'static str) -> impl FnOnce(std::io::Error) -> DomainError {
    move |e| {
        error!(operation, error = %e, "image store call failed");
        DomainError::Infrastructure(format!("{operation} failed: {e}"))
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn put(
        &self,
        object_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError> {
        let path = self.resolve(object_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_error("image directory create"))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(io_error("image write"))?;
        debug!(object_name, content_type, size = bytes.len(), "image stored");
        Ok(object_name.to_owned())
    }

    fn public_url(&self, reference: &str) -> String {
        format!("{}/{reference}", self.base_url)
    }

    async fn remove(&self, reference: &str) -> Result<(), DomainError> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("image remove")(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_under_root_and_returns_name() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "http://localhost:3000/images/");

        // Act
        let reference = store
            .put("reactions/a.png", Some("image/png"), vec![1, 2, 3])
            .await
            .unwrap();

        // Assert
        assert_eq!(reference, "reactions/a.png");
        let written = std::fs::read(dir.path().join("reactions/a.png")).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
        assert_eq!(
            store.public_url(&reference),
            "http://localhost:3000/images/reactions/a.png"
        );
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "http://localhost/images");
        store.put("x.gif", None, vec![0]).await.unwrap();

        store.remove("x.gif").await.unwrap();
        store.remove("x.gif").await.unwrap();

        assert!(!dir.path().join("x.gif").exists());
    }

    #[tokio::test]
    async fn test_rejects_names_escaping_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "http://localhost/images");

        for name in ["../outside.png", "/etc/passwd", ""] {
            let result = store.put(name, None, vec![0]).await;

            match result.unwrap_err() {
                DomainError::Validation(_) => {}
                other => panic!("expected Validation for {name:?}, got {other:?}"),
            }
        }
    }
}
