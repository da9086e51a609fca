use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Write-once store for uploaded images, backed by a directory. Filenames
/// are generated from the upload timestamp and the owner's user id, which
/// keeps them collision-resistant without tracking any extra state.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Store image bytes under `{unix_ts}_{user_id}.jpg` and return the
    /// generated filename.
    pub fn put(&self, user_id: &str, bytes: &[u8]) -> AppResult<String> {
        let filename = sanitize_filename(&format!(
            "{}_{}.jpg",
            chrono::Utc::now().timestamp_millis(),
            user_id
        ));
        let path = self.root.join(&filename);
        std::fs::write(&path, bytes)
            .map_err(|e| AppError::Internal(format!("blob write failed: {}", e)))?;
        Ok(filename)
    }

    /// Fetch stored bytes by filename. Traversal-shaped names are rejected
    /// before touching the filesystem.
    pub fn get(&self, filename: &str) -> AppResult<Vec<u8>> {
        if filename != sanitize_filename(filename) || filename.is_empty() {
            return Err(AppError::NotFound);
        }
        std::fs::read(self.root.join(filename)).map_err(|_| AppError::NotFound)
    }

    /// Best-effort removal, used to undo a blob write when the enclosing
    /// transaction fails.
    pub fn remove(&self, filename: &str) {
        if filename == sanitize_filename(filename) {
            let _ = std::fs::remove_file(self.root.join(filename));
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Keep only characters that cannot escape the storage directory.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}
