//! Storage for uploaded listing photos.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::listings::ImageRef;

const UPLOAD_DIR: &str = "properties";

/// One file part from a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Persists uploaded image bytes and returns the reference stored on the image row.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<ImageRef, MediaError>;
}

/// Writes uploads beneath the media root served at `/media/`.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<ImageRef, MediaError> {
        let relative = upload_path(original_name)?;
        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        debug!(path = %target.display(), size = bytes.len(), "stored listing image");
        Ok(ImageRef(relative))
    }
}

/// `properties/<uuid>.<ext>`, keeping the uploaded extension.
///
/// Rejects names whose extension does not guess to an `image/*` type.
pub fn upload_path(original_name: &str) -> Result<String, MediaError> {
    let unsupported = || MediaError::UnsupportedType {
        name: original_name.to_string(),
    };
    let (_, ext) = original_name.rsplit_once('.').ok_or_else(unsupported)?;
    if ext.is_empty() || ext.contains(['/', '\\']) {
        return Err(unsupported());
    }
    let is_image = mime_guess::from_ext(ext)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE);
    if !is_image {
        return Err(unsupported());
    }
    Ok(format!("{UPLOAD_DIR}/{}.{ext}", Uuid::new_v4()))
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("'{name}' is not a supported image file")]
    UnsupportedType { name: String },
    #[error("image could not be written: {0}")]
    Io(#[from] std::io::Error),
}
