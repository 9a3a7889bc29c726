//! Core data types produced by caption decoding.

use serde::{Deserialize, Serialize};

/// Why decoding stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model predicted the end sentinel
    EndToken,
    /// The step budget ran out before the end sentinel appeared
    StepBudget,
}

/// A generated caption with its decoding metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Caption words, sentinels removed
    pub words: Vec<String>,

    /// Number of model invocations performed
    pub steps: usize,

    /// Why decoding stopped
    pub stop_reason: StopReason,
}

impl Caption {
    /// The caption as a single space-separated string.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// One captioned image, as printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub image_id: String,
    pub caption: String,
    pub steps: usize,
    pub stop_reason: StopReason,
}

impl CaptionRecord {
    pub fn new(image_id: impl Into<String>, caption: &Caption) -> Self {
        Self {
            image_id: image_id.into(),
            caption: caption.text(),
            steps: caption.steps,
            stop_reason: caption.stop_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_text_joins_with_single_spaces() {
        let caption = Caption {
            words: vec!["a".into(), "dog".into(), "runs".into()],
            steps: 4,
            stop_reason: StopReason::EndToken,
        };
        assert_eq!(caption.text(), "a dog runs");
        assert!(!caption.is_empty());
    }

    #[test]
    fn test_record_serializes_stop_reason_snake_case() {
        let caption = Caption {
            words: vec!["dog".into()],
            steps: 34,
            stop_reason: StopReason::StepBudget,
        };
        let json = serde_json::to_string(&CaptionRecord::new("img", &caption)).unwrap();
        assert!(json.contains("\"stop_reason\":\"step_budget\""));
        assert!(json.contains("\"caption\":\"dog\""));
    }
}
