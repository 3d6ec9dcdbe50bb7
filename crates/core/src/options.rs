//! Per-invocation parse configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// How unrecognized keywords and recoverable data problems are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Abort on the first unrecognized keyword or data inconsistency.
    #[default]
    Strict,
    /// Record a warning in the deck and keep going.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub mode: ParseMode,
    /// Deepest permitted nesting of INCLUDE directives below the root file.
    pub max_include_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            mode: ParseMode::default(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        ParseOptions::default()
    }

    pub fn lenient() -> Self {
        ParseOptions {
            mode: ParseMode::Lenient,
            ..ParseOptions::default()
        }
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.mode == ParseMode::Strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_strict() {
        let options = ParseOptions::default();
        assert!(options.is_strict());
        assert_eq!(options.max_include_depth, DEFAULT_MAX_INCLUDE_DEPTH);
    }

    #[test]
    fn deserializes_partial_config() {
        let options: ParseOptions = serde_json::from_str(r#"{ "mode": "lenient" }"#).unwrap();
        assert_eq!(options.mode, ParseMode::Lenient);
        assert_eq!(options.max_include_depth, DEFAULT_MAX_INCLUDE_DEPTH);
    }
}
