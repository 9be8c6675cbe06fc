//! Prompt configuration.

use crate::error::{PromptError, PromptResult};

/// Upper bound on padding rows; anything larger would push output off most screens
pub const MAX_PADDING: usize = 64;

/// Rows kept between the prompt line and callback output by default
pub const DEFAULT_PADDING: usize = 2;

/// Rows below the prompt where debug dumps and read errors are painted
pub const DIAGNOSTIC_PADDING: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PromptConfig {
    /// Label written in front of the input
    pub prefix: String,
    /// Blank rows between the prompt line and callback output
    pub padding: usize,
    /// Paint the buffer text and cursor after every key
    pub debug: bool,
}

impl PromptConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn validate(&self) -> PromptResult<()> {
        if self.padding > MAX_PADDING {
            return Err(PromptError::Config(format!(
                "padding of {} rows exceeds the maximum of {MAX_PADDING}",
                self.padding
            )));
        }
        if self.prefix.contains(['\n', '\r']) {
            return Err(PromptError::Config(
                "prefix must fit on a single line".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            padding: DEFAULT_PADDING,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PromptConfig::new("Summary: ");
        assert_eq!(config.prefix, "Summary: ");
        assert_eq!(config.padding, 2);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PromptConfig::new("> ").with_padding(0).with_debug(true);
        assert_eq!(config.padding, 0);
        assert!(config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = PromptConfig::new("> ").with_padding(65).validate().unwrap_err();
        assert!(matches!(err, PromptError::Config(_)));
        assert!(err.to_string().contains("65"));

        assert!(PromptConfig::new("a\nb").validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_fills_defaults() {
        let config: PromptConfig = serde_json::from_str(r#"{"prefix": "Q: "}"#).unwrap();
        assert_eq!(config, PromptConfig::new("Q: "));

        let json = serde_json::to_string(&config.with_debug(true)).unwrap();
        assert!(json.contains("\"debug\":true"));
    }
}
