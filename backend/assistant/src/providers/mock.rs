use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use umlscan_core::{DiagramAssistant, DraftRequest, RawExtraction, ScanError};

use super::draft_from_reply;

/// An assistant with a canned reply (or failure) that counts its calls.
/// Replies go through the same draft parser as the real providers.
pub struct MockAssistant {
    name: String,
    reply: Option<String>,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockAssistant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: None,
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagramAssistant for MockAssistant {
    fn name(&self) -> &str {
        &self.name
    }

    async fn draft(&self, _request: &DraftRequest<'_>) -> Result<RawExtraction, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(ScanError::unavailable(&self.name, message));
        }
        match &self.reply {
            Some(reply) => draft_from_reply(&self.name, reply),
            None => Ok(RawExtraction::empty()),
        }
    }
}
