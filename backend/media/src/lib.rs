//! Transport-boundary handling of uploaded diagram images.

pub mod mime_detect;
pub mod upload;

pub use mime_detect::{
    detect_mime_type, is_accepted_image, normalize_mime, sniff_image_type, ACCEPTED_IMAGE_TYPES,
};
pub use upload::{validate_upload, ImageUpload, UploadLimits, DEFAULT_MAX_UPLOAD_BYTES};
