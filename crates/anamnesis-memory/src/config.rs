//! Configuration for memory creation and validation

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Limits and defaults applied when memories are created or validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Platform recorded when the caller names none
    pub default_platform: String,
    /// Confidence recorded when the caller declares none
    pub default_confidence: f64,
    /// Maximum summary length, in chars
    pub max_summary_chars: usize,
    /// Maximum body length, in chars
    pub max_body_chars: usize,
    /// Maximum length of a single tag, in chars
    pub max_tag_chars: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            default_platform: "clawdbot".to_string(),
            default_confidence: 0.5,
            max_summary_chars: 280,
            max_body_chars: 10_000,
            max_tag_chars: 64,
        }
    }
}

impl MemoryConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the default platform
    pub fn with_default_platform(mut self, platform: impl Into<String>) -> Self {
        self.default_platform = platform.into();
        self
    }

    /// Set the default confidence (clamped to [0, 1])
    pub fn with_default_confidence(mut self, confidence: f64) -> Self {
        self.default_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set the maximum summary length
    pub fn with_max_summary_chars(mut self, max: usize) -> Self {
        self.max_summary_chars = max;
        self
    }

    /// Set the maximum body length
    pub fn with_max_body_chars(mut self, max: usize) -> Self {
        self.max_body_chars = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MemoryConfig::default();
        assert_eq!(config.default_platform, "clawdbot");
        assert_eq!(config.default_confidence, 0.5);
        assert_eq!(config.max_body_chars, 10_000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MemoryConfig::from_json(r#"{"max_body_chars": 500}"#).unwrap();
        assert_eq!(config.max_body_chars, 500);
        assert_eq!(config.max_summary_chars, 280);
        assert_eq!(config.default_platform, "clawdbot");
    }

    #[test]
    fn test_builder_clamps_confidence() {
        let config = MemoryConfig::default()
            .with_default_platform("moltbook")
            .with_default_confidence(1.7)
            .with_max_summary_chars(80);
        assert_eq!(config.default_platform, "moltbook");
        assert_eq!(config.default_confidence, 1.0);
        assert_eq!(config.max_summary_chars, 80);
    }
}
