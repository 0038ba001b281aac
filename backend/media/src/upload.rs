//! Upload validation at the transport boundary.
//!
//! Turns whatever the client sent into either a validated `ImageInput` or an
//! input-class `ScanError`. Nothing here calls an extraction backend.

use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use umlscan_core::{ImageInput, ScanError};

use crate::mime_detect::{detect_mime_type, is_accepted_image, normalize_mime, sniff_image_type};

/// Upload cap applied when none is configured (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A file as received from the client, before validation.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl ImageUpload {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Resolve the effective type: declared (if accepted), then sniffed, then
/// by file extension.
fn resolve_mime(upload: &ImageUpload) -> Option<String> {
    let declared = upload
        .content_type
        .as_deref()
        .map(normalize_mime)
        .filter(|m| is_accepted_image(m));
    declared
        .or_else(|| sniff_image_type(&upload.data).map(str::to_string))
        .or_else(|| {
            upload
                .filename
                .as_deref()
                .map(|f| detect_mime_type(Path::new(f)))
                .filter(|m| is_accepted_image(m))
                .map(str::to_string)
        })
}

/// Validate an optional upload against the accepted types and size cap.
pub fn validate_upload(
    upload: Option<ImageUpload>,
    limits: UploadLimits,
) -> Result<ImageInput, ScanError> {
    let upload = upload.ok_or(ScanError::NoImage)?;
    if upload.data.is_empty() {
        return Err(ScanError::NoImage);
    }
    if upload.data.len() > limits.max_bytes {
        return Err(ScanError::ImageTooLarge {
            size: upload.data.len(),
            max: limits.max_bytes,
        });
    }

    let mime = resolve_mime(&upload).ok_or_else(|| {
        ScanError::UnsupportedMediaType(
            upload
                .content_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        )
    })?;

    debug!(
        filename = upload.filename.as_deref().unwrap_or("-"),
        mime = %mime,
        size = upload.data.len(),
        "Upload accepted"
    );
    Ok(ImageInput::new(upload.data.to_vec(), mime))
}
