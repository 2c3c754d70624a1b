//! Filesystem-backed content store.
//!
//! Refs are relative paths resolved against a fixed root directory. The
//! store is read-only; documents are authored and maintained elsewhere.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use guidepost_core::content::ContentStore;
use guidepost_core::error::ContentError;
use tracing::debug;

/// Serves documents from a directory tree.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a ref to a path under the root. Absolute refs and refs that
    /// climb out of the root are rejected outright.
    fn resolve(&self, ref_: &str) -> Result<PathBuf, ContentError> {
        let rel = Path::new(ref_);
        let escapes = rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if escapes {
            return Err(ContentError::Io {
                ref_: ref_.to_string(),
                reason: "ref escapes the content root".into(),
            });
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    fn name(&self) -> &str {
        "fs"
    }

    async fn fetch(&self, ref_: &str) -> Result<String, ContentError> {
        let path = self.resolve(ref_)?;
        debug!(content_ref = ref_, path = %path.display(), "Reading document");

        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ContentError::NotFound {
                ref_: ref_.to_string(),
            }),
            Err(e) => Err(ContentError::Io {
                ref_: ref_.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_doc(name: &str, body: &str) -> (tempfile::TempDir, FsContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, body).unwrap();
        let store = FsContentStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn fetches_relative_refs() {
        let (_dir, store) = store_with_doc("sql/optimizer.md", "# Optimization\n");
        let body = store.fetch("sql/optimizer.md").await.unwrap();
        assert_eq!(body, "# Optimization\n");
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let (_dir, store) = store_with_doc("a.md", "x");
        let err = store.fetch("b.md").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));
        assert_eq!(err.ref_(), "b.md");
    }

    #[tokio::test]
    async fn parent_traversal_rejected() {
        let (_dir, store) = store_with_doc("a.md", "x");
        let err = store.fetch("../outside.md").await.unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
        assert!(err.to_string().contains("escapes"));
    }

    #[tokio::test]
    async fn absolute_ref_rejected() {
        let (_dir, store) = store_with_doc("a.md", "x");
        let err = store.fetch("/etc/hostname").await.unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
    }
}
