//! Suggestion synthesis, contextual help and the assistant response builder.

pub mod builder;
pub mod cardinality;
pub mod help;
pub mod locale;
pub mod providers;
pub mod synthesizer;

pub use builder::{
    AssistantRequest, ContextualHelpRequest, Outcome, ResponseBuilder, ScanRequest, TerminalState,
};
pub use cardinality::{suggest_cardinality, CardinalityRequest, CardinalitySuggestion};
pub use help::{detect_intents, review_tips, ContextualHelper, DEFAULT_ASSISTANT_TIMEOUT};
pub use locale::Locale;
pub use synthesizer::{suggestions_for, ConfidenceTier, Synthesizer};
