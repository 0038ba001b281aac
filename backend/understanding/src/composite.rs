//! Runs several extraction backends on the same image and pools their
//! candidates. Overlap between backends is left to the normalizer.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use umlscan_core::{ExtractionBackend, ImageInput, RawExtraction, ScanError};
use umlscan_logging::redact_sensitive_data;

pub struct CompositeExtractor {
    backends: Vec<Arc<dyn ExtractionBackend>>,
}

impl CompositeExtractor {
    pub fn new() -> Self {
        Self { backends: Vec::new() }
    }

    /// Add a backend. On total failure the first registered backend's error
    /// is the one reported.
    pub fn with_backend(mut self, backend: Arc<dyn ExtractionBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }
}

/// Backend error text as it may appear in logs.
fn log_detail(error: &ScanError) -> String {
    redact_sensitive_data(&error.to_string())
}

impl Default for CompositeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionBackend for CompositeExtractor {
    fn name(&self) -> &str {
        "composite"
    }

    async fn extract(&self, image: &ImageInput) -> Result<RawExtraction, ScanError> {
        if self.backends.is_empty() {
            return Err(ScanError::unavailable(
                self.name(),
                "no extraction backend configured",
            ));
        }

        let results = join_all(self.backends.iter().map(|b| b.extract(image))).await;

        let mut pooled: Option<RawExtraction> = None;
        let mut first_error = None;
        for (backend, result) in self.backends.iter().zip(results) {
            match result {
                Ok(raw) => {
                    info!(
                        backend = backend.name(),
                        classes = raw.classes.len(),
                        relations = raw.relations.len(),
                        "Backend extraction finished"
                    );
                    pooled.get_or_insert_with(RawExtraction::empty).absorb(raw);
                }
                Err(e) => {
                    warn!(
                        backend = backend.name(),
                        error = %log_detail(&e),
                        "Backend extraction failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match (pooled, first_error) {
            (Some(raw), _) => Ok(raw),
            (None, Some(err)) => Err(err),
            (None, None) => Ok(RawExtraction::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExtractor;
    use umlscan_core::ScannedClass;

    fn image() -> ImageInput {
        ImageInput::new(vec![0x89, 0x50, 0x4E, 0x47], "image/png")
    }

    #[tokio::test]
    async fn pools_candidates_from_all_backends() {
        let ocr = MockExtractor::returning(RawExtraction {
            classes: vec![ScannedClass::new("Order", 0.5)],
            confidence: 0.5,
            ..RawExtraction::default()
        });
        let vision = MockExtractor::returning(RawExtraction {
            classes: vec![ScannedClass::new("order", 0.9), ScannedClass::new("User", 0.8)],
            confidence: 0.85,
            ..RawExtraction::default()
        });
        let composite = CompositeExtractor::new()
            .with_backend(Arc::new(vision))
            .with_backend(Arc::new(ocr));

        let raw = composite.extract(&image()).await.unwrap();
        assert_eq!(raw.classes.len(), 3);
        assert_eq!(raw.confidence, 0.85);
    }

    #[tokio::test]
    async fn tolerates_one_failing_backend() {
        let composite = CompositeExtractor::new()
            .with_backend(Arc::new(MockExtractor::failing("vision down")))
            .with_backend(Arc::new(MockExtractor::returning(RawExtraction {
                classes: vec![ScannedClass::new("User", 0.6)],
                ..RawExtraction::default()
            })));

        let raw = composite.extract(&image()).await.unwrap();
        assert_eq!(raw.classes.len(), 1);
    }

    #[tokio::test]
    async fn reports_first_error_when_all_fail() {
        let composite = CompositeExtractor::new()
            .with_backend(Arc::new(MockExtractor::malformed("bad json")))
            .with_backend(Arc::new(MockExtractor::failing("ocr down")));

        let err = composite.extract(&image()).await.unwrap_err();
        assert!(matches!(err, ScanError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn empty_composite_is_unavailable() {
        let err = CompositeExtractor::new().extract(&image()).await.unwrap_err();
        assert!(matches!(err, ScanError::BackendUnavailable { .. }));
    }

    #[test]
    fn logged_errors_hide_api_keys() {
        let err = ScanError::unavailable(
            "vision",
            "error sending request for url (https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=AIzaSECRET)",
        );
        let detail = log_detail(&err);
        assert!(!detail.contains("AIzaSECRET"));
        assert!(detail.contains("generateContent?key=[REDACTED]"));
    }
}
