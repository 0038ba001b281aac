//! Pipeline Event Logger
//!
//! One structured event per scan/assistant request, emitted through `tracing`
//! so it lands in the NDJSON file alongside the request span.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    Suggested {
        class_count: usize,
        relation_count: usize,
        confidence: f32,
        discarded: usize,
        merged: usize,
        /// Set when the AI assistant failed and heuristics answered alone.
        #[serde(skip_serializing_if = "Option::is_none")]
        assistant_failure: Option<String>,
    },
    Degraded {
        failure: String,
        detail: String,
    },
    Empty {
        reason: String,
    },
}

#[derive(Debug, Serialize)]
pub struct PipelineEventEntry {
    pub timestamp: DateTime<Utc>,
    pub event: PipelineEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Build the log entry, redacting free-text detail.
    pub fn entry(mut event: PipelineEvent) -> PipelineEventEntry {
        match &mut event {
            PipelineEvent::Degraded { detail, .. } => {
                *detail = redact_sensitive_data(detail);
            }
            PipelineEvent::Empty { reason } => {
                *reason = redact_sensitive_data(reason);
            }
            PipelineEvent::Suggested { .. } => {}
        }

        PipelineEventEntry {
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log_event(event: PipelineEvent) {
        let entry = Self::entry(event);
        info!(target: "pipeline_events", event = ?entry, "Pipeline outcome");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_detail_is_redacted() {
        let entry = EventLogger::entry(PipelineEvent::Degraded {
            failure: "backend".into(),
            detail: "OpenAI vision error 401: Bearer abc.def.ghi".into(),
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "degraded");
        assert!(!json["event"]["detail"].as_str().unwrap().contains("abc.def.ghi"));
    }

    #[test]
    fn suggested_omits_absent_assistant_failure() {
        let entry = EventLogger::entry(PipelineEvent::Suggested {
            class_count: 1,
            relation_count: 0,
            confidence: 1.0,
            discarded: 0,
            merged: 0,
            assistant_failure: None,
        });
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "suggested");
        assert!(json["event"].get("assistant_failure").is_none());
    }
}
