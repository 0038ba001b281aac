use serde::{Deserialize, Serialize};

use crate::types::{ScannedClass, ScannedRelation};

/// Additions proposed to the editor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Suggestions {
    pub classes: Vec<ScannedClass>,
    pub relations: Vec<ScannedRelation>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.relations.is_empty()
    }
}

/// Payload returned to the UI for every scan or assistant request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    pub message: String,
    pub suggestions: Suggestions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
}

impl AssistantResponse {
    pub fn new(message: impl Into<String>, suggestions: Suggestions) -> Self {
        Self {
            message: message.into(),
            suggestions,
            tips: None,
            next_steps: None,
        }
    }

    /// Attach tips; an empty list leaves the field absent.
    pub fn with_tips(mut self, tips: Vec<String>) -> Self {
        self.tips = (!tips.is_empty()).then_some(tips);
        self
    }

    pub fn with_next_steps(mut self, steps: Vec<String>) -> Self {
        self.next_steps = (!steps.is_empty()).then_some(steps);
        self
    }
}

/// Reply shape of the image analysis endpoint: text under `content`, no
/// tips or next steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub content: String,
    pub suggestions: Suggestions,
}

impl From<AssistantResponse> for AnalysisResponse {
    fn from(response: AssistantResponse) -> Self {
        Self {
            content: response.message,
            suggestions: response.suggestions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_field_exact_shape() {
        let response = AssistantResponse::new("ok", Suggestions::default())
            .with_next_steps(vec!["retry".into()]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "ok");
        assert!(json["suggestions"]["classes"].as_array().unwrap().is_empty());
        assert!(json["suggestions"]["relations"].as_array().unwrap().is_empty());
        assert!(json.get("tips").is_none());
        assert_eq!(json["nextSteps"][0], "retry");
    }

    #[test]
    fn analysis_keeps_text_under_content() {
        let response = AssistantResponse::new("scanned", Suggestions::default())
            .with_tips(vec!["tip".into()]);
        let json = serde_json::to_value(AnalysisResponse::from(response)).unwrap();
        assert_eq!(json["content"], "scanned");
        assert!(json.get("message").is_none());
        assert!(json.get("tips").is_none());
        assert!(json["suggestions"]["classes"].as_array().unwrap().is_empty());
    }
}
