use serde::{Deserialize, Serialize};
use simatch_features::ExtractionOptions;
use simatch_matcher::{MatchPolicy, Matcher, SearchStrategy, DEFAULT_CHECKS, DEFAULT_RATIO};
use simatch_score::ScoringProfile;

use crate::{CompareError, CompareResult};

/// Complete comparison configuration with all pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Worker threads for the matching stage
    pub threads: usize,
    /// Feature extraction settings
    pub extraction: ExtractionOptions,
    /// Candidate search backend
    pub strategy: SearchStrategy,
    /// Match acceptance policy
    pub policy: MatchPolicy,
    /// Score scaling and confidence cuts
    pub scoring: ScoringProfile,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            version: None,
            threads: num_cpus::get().max(1),
            extraction: ExtractionOptions::default(),
            strategy: SearchStrategy::default(),
            policy: MatchPolicy::default(),
            scoring: ScoringProfile::default(),
        }
    }
}

impl CompareConfig {
    /// Conservative preset: exact search, strict filtering, capped scores
    pub fn conservative_preset() -> Self {
        Self {
            name: Some("Conservative".to_string()),
            description: Some(
                "Exact search with strict ratio filtering and capped scores".to_string(),
            ),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Standard preset: indexed search over a larger feature budget
    pub fn standard_preset() -> Self {
        Self {
            name: Some("Standard".to_string()),
            description: Some(
                "Indexed search over a larger feature budget with full-range scores".to_string(),
            ),
            version: Some("1.0".to_string()),
            threads: num_cpus::get().max(1),
            extraction: ExtractionOptions {
                max_features: 500,
                min_contrast: 0.04,
                ..ExtractionOptions::default()
            },
            strategy: SearchStrategy::Indexed { checks: DEFAULT_CHECKS },
            policy: MatchPolicy::RatioTest { ratio: DEFAULT_RATIO },
            scoring: ScoringProfile::standard(),
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    pub fn with_extraction(mut self, extraction: ExtractionOptions) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringProfile) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Matcher assembled from the strategy and policy settings
    pub fn matcher(&self) -> Matcher {
        Matcher::new()
            .with_strategy(self.strategy)
            .with_policy(self.policy)
    }

    /// Get a human-readable configuration summary
    pub fn summary(&self) -> String {
        let search = match self.strategy {
            SearchStrategy::Exact => "exact".to_string(),
            SearchStrategy::Indexed { checks } => format!("indexed({})", checks),
        };
        let policy = match self.policy {
            MatchPolicy::RatioTest { ratio } => format!("ratio({})", ratio),
            MatchPolicy::CrossCheck { .. } => "cross-check".to_string(),
        };
        format!(
            "CompareConfig: {}, features={}, search={}, policy={}, scale={:.0}, threads={}",
            self.name.as_deref().unwrap_or("custom"),
            self.extraction.max_features,
            search,
            policy,
            self.scoring.scale,
            self.threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> CompareResult<()> {
        if self.threads == 0 {
            return Err(CompareError::Config("threads must be at least 1"));
        }
        self.extraction.validate()?;
        self.matcher().validate()?;
        self.scoring.validate()?;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CompareConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.name.is_none());
    }

    #[test]
    fn presets_validate_and_carry_metadata() {
        let conservative = CompareConfig::conservative_preset();
        assert!(conservative.validate().is_ok());
        assert_eq!(conservative.name.as_deref(), Some("Conservative"));
        assert_eq!(conservative.strategy, SearchStrategy::Exact);

        let standard = CompareConfig::standard_preset();
        assert!(standard.validate().is_ok());
        assert_eq!(standard.name.as_deref(), Some("Standard"));
        assert_eq!(standard.extraction.max_features, 500);
        assert!(matches!(standard.strategy, SearchStrategy::Indexed { .. }));
    }

    #[test]
    fn json_round_trip_preserves_settings() {
        let config = CompareConfig::standard_preset();
        let json = config.to_json().unwrap();
        let loaded = CompareConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn toml_round_trip_preserves_settings() {
        let config = CompareConfig::conservative_preset()
            .with_metadata("Archive", "Tuned for archive deduplication");
        let toml = config.to_toml().unwrap();
        let loaded = CompareConfig::from_toml(&toml).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn loading_rejects_invalid_settings() {
        let mut config = CompareConfig::default();
        config.threads = 0;
        let json = config.to_json().unwrap();
        assert!(CompareConfig::from_json(&json).is_err());

        let mut config = CompareConfig::default();
        config.policy = MatchPolicy::RatioTest { ratio: 1.5 };
        let json = config.to_json().unwrap();
        assert!(CompareConfig::from_json(&json).is_err());
    }

    #[test]
    fn fluent_overrides_apply() {
        let config = CompareConfig::conservative_preset()
            .with_strategy(SearchStrategy::Indexed { checks: 80 })
            .with_policy(MatchPolicy::CrossCheck { max_distance: Some(50.0) })
            .with_threads(2);
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy, SearchStrategy::Indexed { checks: 80 });
        assert_eq!(config.threads, 2);
        assert_eq!(config.name.as_deref(), Some("Conservative"));
    }

    #[test]
    fn absent_metadata_is_skipped() {
        let json = CompareConfig::default().to_json().unwrap();
        assert!(!json.contains("\"name\""));
        assert!(!json.contains("\"description\""));
    }

    #[test]
    fn summary_names_the_preset() {
        let summary = CompareConfig::standard_preset().summary();
        assert!(summary.contains("Standard"));
        assert!(summary.contains("indexed(50)"));
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir();
        let json_path = dir.join("simatch_config_test.json");
        let toml_path = dir.join("simatch_config_test.toml");

        let config = CompareConfig::standard_preset();
        config.save_json(&json_path).unwrap();
        config.save_toml(&toml_path).unwrap();

        assert_eq!(CompareConfig::load_json(&json_path).unwrap(), config);
        assert_eq!(CompareConfig::load_toml(&toml_path).unwrap(), config);

        let _ = std::fs::remove_file(json_path);
        let _ = std::fs::remove_file(toml_path);
    }
}
