//! Structured logging for the diagram scanner.
//!
//! Console plus rolling NDJSON output, secret redaction, and pipeline
//! outcome events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogger, PipelineEvent, PipelineEventEntry};
pub use logger::{init_console_logger, init_logger};
pub use redact::redact_sensitive_data;
