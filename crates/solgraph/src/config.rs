//! Analyzer configuration: a builder-style struct in the same shape as the
//! teacher's `CompilerConfig`, plus an optional TOML override document in
//! the teacher's `LintConfig` embedded-default/`merge` style.

use std::collections::HashSet;

use serde::Deserialize;

#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub disabled_detectors: HashSet<String>,
    pub max_blocks_per_function: Option<usize>,
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        AnalyzerConfig::default()
    }

    pub fn with_disabled_detector(mut self, id: impl Into<String>) -> Self {
        self.disabled_detectors.insert(id.into());
        self
    }

    pub fn with_max_blocks(mut self, n: usize) -> Self {
        self.max_blocks_per_function = Some(n);
        self
    }

    /// Merges a TOML override document (`[detectors] disabled = [...]`)
    /// into this config, returning the combined result.
    pub fn merge(mut self, toml_doc: &str) -> Result<Self, String> {
        let parsed: TomlConfig = toml::from_str(toml_doc).map_err(|e| format!("invalid config: {e}"))?;
        if let Some(detectors) = parsed.detectors {
            self.disabled_detectors.extend(detectors.disabled);
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
struct TomlConfig {
    detectors: Option<DetectorsConfig>,
}

#[derive(Debug, Deserialize)]
struct DetectorsConfig {
    #[serde(default)]
    disabled: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_chain() {
        let config = AnalyzerConfig::new().with_disabled_detector("reentrancy").with_max_blocks(500);
        assert!(config.disabled_detectors.contains("reentrancy"));
        assert_eq!(config.max_blocks_per_function, Some(500));
    }

    #[test]
    fn merge_adds_disabled_detectors_from_toml() {
        let config = AnalyzerConfig::new().merge("[detectors]\ndisabled = [\"reentrancy\"]").unwrap();
        assert!(config.disabled_detectors.contains("reentrancy"));
    }

    #[test]
    fn merge_rejects_malformed_toml() {
        let result = AnalyzerConfig::new().merge("not valid [[[ toml");
        assert!(result.is_err());
    }

    #[test]
    fn default_runs_every_detector() {
        let config = AnalyzerConfig::default();
        assert!(config.disabled_detectors.is_empty());
        assert!(config.max_blocks_per_function.is_none());
    }
}
