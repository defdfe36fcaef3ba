//! Blob storage for uploaded audio and whiteboard snapshots
//!
//! Files land under `<upload_dir>/<session_id>/<filename>` and are later
//! served statically; the returned locator is embedded verbatim in
//! persisted records and client responses.

use std::path::PathBuf;

use s2s_common::{Error, Result};

pub struct BlobStorage {
    upload_dir: PathBuf,
}

impl BlobStorage {
    pub fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }

    /// Store a blob and return its public locator.
    pub async fn store(&self, session_id: &str, filename: &str, data: &[u8]) -> Result<String> {
        validate_component(session_id)?;
        validate_component(filename)?;

        let session_dir = self.upload_dir.join(session_id);
        tokio::fs::create_dir_all(&session_dir).await?;

        let path = session_dir.join(filename);
        tokio::fs::write(&path, data).await?;

        Ok(format!("/uploads/{}/{}", session_id, filename))
    }
}

/// Path components come from client-supplied identifiers; keep them to a
/// single directory level.
fn validate_component(component: &str) -> Result<()> {
    if component.is_empty()
        || component == "."
        || component == ".."
        || component.contains('/')
        || component.contains('\\')
    {
        return Err(Error::InvalidInput(format!(
            "Invalid path component: {}",
            component
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_file_and_returns_locator() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlobStorage::new(dir.path().to_path_buf());

        let url = storage.store("sess-1", "audio_1.webm", b"bytes").await.unwrap();
        assert_eq!(url, "/uploads/sess-1/audio_1.webm");

        let on_disk = tokio::fs::read(dir.path().join("sess-1/audio_1.webm"))
            .await
            .unwrap();
        assert_eq!(on_disk, b"bytes");
    }

    #[tokio::test]
    async fn test_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = BlobStorage::new(dir.path().to_path_buf());

        assert!(storage.store("..", "a.webm", b"x").await.is_err());
        assert!(storage.store("sess", "../../etc", b"x").await.is_err());
        assert!(storage.store("a/b", "c.webm", b"x").await.is_err());
    }
}
