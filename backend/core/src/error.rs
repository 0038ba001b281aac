use std::time::Duration;

use thiserror::Error;

/// Error taxonomy for the scan pipeline.
///
/// Only transport and backend faults are represented here. Data
/// inconsistencies (dangling relation endpoints, duplicate classes) are
/// resolved by the normalizer and never become errors.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no image provided")]
    NoImage,

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("extraction backend unavailable ({backend}): {message}")]
    BackendUnavailable { backend: String, message: String },

    #[error("malformed response from {backend}: {message}")]
    MalformedResponse { backend: String, message: String },

    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse failure class used to pick the terminal state and guidance text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Nothing usable reached the pipeline; no backend call is made.
    Input,
    /// The extraction or AI backend failed.
    Backend,
}

impl ScanError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::NoImage
            | Self::UnsupportedMediaType(_)
            | Self::ImageTooLarge { .. }
            | Self::InvalidUpload(_) => FailureClass::Input,
            Self::BackendUnavailable { .. }
            | Self::MalformedResponse { .. }
            | Self::Timeout(_)
            | Self::Other(_) => FailureClass::Backend,
        }
    }

    pub fn unavailable(backend: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed(backend: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            backend: backend.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_never_reach_backend_class() {
        assert_eq!(ScanError::NoImage.class(), FailureClass::Input);
        assert_eq!(
            ScanError::ImageTooLarge { size: 20, max: 10 }.class(),
            FailureClass::Input
        );
        assert_eq!(
            ScanError::UnsupportedMediaType("text/plain".into()).class(),
            FailureClass::Input
        );
    }

    #[test]
    fn backend_errors_are_classified() {
        assert_eq!(
            ScanError::unavailable("vision", "connection refused").class(),
            FailureClass::Backend
        );
        assert_eq!(
            ScanError::Timeout(Duration::from_secs(3)).class(),
            FailureClass::Backend
        );
        let other: ScanError = anyhow::anyhow!("boom").into();
        assert_eq!(other.class(), FailureClass::Backend);
    }
}
