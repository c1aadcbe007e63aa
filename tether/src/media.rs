//! Upload classification and on-disk storage for post media and profile pictures.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::{
    errors::{RepoError, ValidationError, ValidationResult},
    id::generate_entity_id,
    models::{Media, MediaKind},
};

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_VIDEO_BYTES: usize = 50 * 1024 * 1024;
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Accepted media types and their size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaPolicy {
    pub max_image_bytes: usize,
    pub max_video_bytes: usize,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
        }
    }
}

impl MediaPolicy {
    /// Classifies an upload by content type and checks its size against the kind's limit.
    pub fn classify(&self, field: &str, content_type: Option<&str>, size: usize) -> ValidationResult<MediaKind> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        let (kind, limit) = if content_type.starts_with("image/") {
            (MediaKind::Image, self.max_image_bytes)
        } else if content_type.starts_with("video/") {
            (MediaKind::Video, self.max_video_bytes)
        } else {
            return Err(ValidationError::single(
                field,
                "unsupported_media_type",
                "only image and video uploads are accepted",
            ));
        };
        if size == 0 {
            return Err(ValidationError::single(field, "empty_file", "uploaded file is empty"));
        }
        if size > limit {
            return Err(ValidationError::single(
                field,
                "file_too_large",
                format!("{} uploads are limited to {limit} bytes", kind.as_str()),
            ));
        }
        Ok(kind)
    }

    /// Largest request body worth accepting at all.
    pub fn body_limit(&self) -> usize {
        self.max_image_bytes.max(self.max_video_bytes) + 64 * 1024
    }
}

/// Writes accepted uploads under one directory and hands back `/uploads/<file>` references.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(&self, kind: MediaKind, original_name: Option<&str>, bytes: &[u8]) -> Result<Media, RepoError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| RepoError::other(format!("failed to create uploads directory: {err}")))?;
        let file_name = match extension_of(original_name) {
            Some(ext) => format!("{}.{ext}", generate_entity_id()),
            None => generate_entity_id(),
        };
        tokio::fs::write(self.root.join(&file_name), bytes)
            .await
            .map_err(|err| RepoError::other(format!("failed to store upload: {err}")))?;
        debug!("stored {} upload {file_name} ({} bytes)", kind.as_str(), bytes.len());
        Ok(Media {
            reference: format!("{UPLOADS_ROUTE}/{file_name}"),
            kind,
        })
    }

    /// Deletes a previously stored upload. References outside this store are ignored.
    pub async fn remove(&self, reference: &str) {
        let Some(file_name) = reference.strip_prefix(&format!("{UPLOADS_ROUTE}/")) else {
            return;
        };
        if file_name.is_empty() || file_name.contains('/') || file_name.contains("..") {
            return;
        }
        if let Err(err) = tokio::fs::remove_file(self.root.join(file_name)).await {
            warn!("failed to remove upload {file_name}: {err}");
        }
    }
}

/// Lowercased alphanumeric extension of the client-supplied file name, if any.
fn extension_of(original_name: Option<&str>) -> Option<String> {
    let ext = Path::new(original_name?).extension()?.to_str()?.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}
