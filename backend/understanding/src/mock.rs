use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use umlscan_core::{ExtractionBackend, ImageInput, RawExtraction, ScanError};

enum MockOutcome {
    Extraction(RawExtraction),
    Unavailable(String),
    Malformed(String),
}

/// An extraction backend with a canned outcome that counts its calls.
pub struct MockExtractor {
    outcome: MockOutcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockExtractor {
    fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(raw: RawExtraction) -> Self {
        Self::with_outcome(MockOutcome::Extraction(raw))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Unavailable(message.into()))
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Malformed(message.into()))
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionBackend for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(&self, _image: &ImageInput) -> Result<RawExtraction, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.outcome {
            MockOutcome::Extraction(raw) => Ok(raw.clone()),
            MockOutcome::Unavailable(message) => Err(ScanError::unavailable(self.name(), message)),
            MockOutcome::Malformed(message) => Err(ScanError::malformed(self.name(), message)),
        }
    }
}
