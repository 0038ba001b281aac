//! `scan_diagram_image`: extraction with a bounded wait, then normalization.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use umlscan_core::{DiagramScanResult, ExtractionBackend, ImageInput, ScanError};

use crate::normalize::normalize;

pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DiagramScanner {
    backend: Arc<dyn ExtractionBackend>,
    timeout: Duration,
}

impl DiagramScanner {
    pub fn new(backend: Arc<dyn ExtractionBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Extract and normalize one image.
    ///
    /// Fails only for an empty buffer or a backend fault; an image in which
    /// nothing was detected yields an empty result.
    #[instrument(skip_all, fields(backend = self.backend.name(), bytes = image.bytes.len()))]
    pub async fn scan_diagram_image(
        &self,
        image: &ImageInput,
    ) -> Result<DiagramScanResult, ScanError> {
        if image.bytes.is_empty() {
            return Err(ScanError::NoImage);
        }

        let raw = tokio::time::timeout(self.timeout, self.backend.extract(image))
            .await
            .map_err(|_| ScanError::Timeout(self.timeout))??;

        let result = normalize(&raw);
        info!(
            class_count = result.classes.len(),
            relation_count = result.relations.len(),
            confidence = result.confidence,
            backend_confidence = raw.confidence,
            discarded = result.discarded,
            merged = result.merged,
            "Scan completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExtractor;
    use umlscan_core::{RawExtraction, RelationKind, ScannedClass, ScannedRelation};

    fn png() -> ImageInput {
        ImageInput::new(vec![0x89, 0x50, 0x4E, 0x47], "image/png")
    }

    #[tokio::test]
    async fn normalizes_backend_output() {
        let backend = Arc::new(MockExtractor::returning(RawExtraction {
            classes: vec![
                ScannedClass::new("Order", 0.6),
                ScannedClass::new(" order ", 0.8),
                ScannedClass::new("Customer", 0.9),
            ],
            relations: vec![
                ScannedRelation::new("Order", "Customer", RelationKind::Association, 0.7),
                ScannedRelation::new("Order", "Invoice", RelationKind::Association, 0.7),
            ],
            ..RawExtraction::default()
        }));
        let scanner = DiagramScanner::new(backend.clone());

        let result = scanner.scan_diagram_image(&png()).await.unwrap();
        assert_eq!(result.classes.len(), 2);
        assert_eq!(result.classes[0].confidence, 0.8);
        assert_eq!(result.relations.len(), 1);
        assert_eq!(result.discarded, 1);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn nothing_detected_is_not_an_error() {
        let scanner = DiagramScanner::new(Arc::new(MockExtractor::returning(RawExtraction::empty())));
        let result = scanner.scan_diagram_image(&png()).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn empty_buffer_skips_backend() {
        let backend = Arc::new(MockExtractor::returning(RawExtraction::empty()));
        let scanner = DiagramScanner::new(backend.clone());
        let err = scanner
            .scan_diagram_image(&ImageInput::new(Vec::new(), "image/png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::NoImage));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let scanner = DiagramScanner::new(Arc::new(MockExtractor::failing("connection refused")));
        let err = scanner.scan_diagram_image(&png()).await.unwrap_err();
        assert!(matches!(err, ScanError::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let backend = MockExtractor::returning(RawExtraction::empty())
            .with_delay(Duration::from_millis(200));
        let scanner = DiagramScanner::new(Arc::new(backend))
            .with_timeout(Duration::from_millis(20));
        let err = scanner.scan_diagram_image(&png()).await.unwrap_err();
        assert!(matches!(err, ScanError::Timeout(_)));
    }
}
