use crate::core::pll::regularization::L2Penalty;
use crate::core::weights::{Reweighting, WeightError};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_LAMBDA_SINGLE: f64 = 0.01;
pub const DEFAULT_LAMBDA_PAIR: f64 = 0.2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Regularization coefficient '{name}' must be finite and non-negative, got {value}")]
    InvalidCoefficient { name: &'static str, value: f64 },
    #[error("Invalid reweighting setting: {0}")]
    Reweighting(#[from] WeightError),
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Settings of one pseudo-likelihood evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EvaluatorConfig {
    #[serde(default = "default_lambda_single")]
    pub lambda_single: f64,
    #[serde(default = "default_lambda_pair")]
    pub lambda_pair: f64,
    #[serde(default)]
    pub reweighting: Reweighting,
}

fn default_lambda_single() -> f64 {
    DEFAULT_LAMBDA_SINGLE
}

fn default_lambda_pair() -> f64 {
    DEFAULT_LAMBDA_PAIR
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            lambda_single: DEFAULT_LAMBDA_SINGLE,
            lambda_pair: DEFAULT_LAMBDA_PAIR,
            reweighting: Reweighting::default(),
        }
    }
}

impl EvaluatorConfig {
    /// Reads the configuration from a TOML file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("lambda_single", self.lambda_single),
            ("lambda_pair", self.lambda_pair),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidCoefficient { name, value });
            }
        }
        self.reweighting.validate()?;
        Ok(())
    }

    pub fn penalty(&self) -> L2Penalty {
        L2Penalty::new(self.lambda_single, self.lambda_pair)
    }
}

#[derive(Default)]
pub struct EvaluatorConfigBuilder {
    lambda_single: Option<f64>,
    lambda_pair: Option<f64>,
    reweighting: Option<Reweighting>,
}

impl EvaluatorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lambda_single(mut self, lambda: f64) -> Self {
        self.lambda_single = Some(lambda);
        self
    }
    pub fn lambda_pair(mut self, lambda: f64) -> Self {
        self.lambda_pair = Some(lambda);
        self
    }
    pub fn reweighting(mut self, reweighting: Reweighting) -> Self {
        self.reweighting = Some(reweighting);
        self
    }

    pub fn build(self) -> Result<EvaluatorConfig, ConfigError> {
        let config = EvaluatorConfig {
            lambda_single: self
                .lambda_single
                .ok_or(ConfigError::MissingParameter("lambda_single"))?,
            lambda_pair: self
                .lambda_pair
                .ok_or(ConfigError::MissingParameter("lambda_pair"))?,
            reweighting: self
                .reweighting
                .ok_or(ConfigError::MissingParameter("reweighting"))?,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn builder_succeeds_with_all_parameters() {
        let config = EvaluatorConfigBuilder::new()
            .lambda_single(0.5)
            .lambda_pair(1.5)
            .reweighting(Reweighting::None)
            .build()
            .unwrap();
        assert_eq!(config.lambda_single, 0.5);
        assert_eq!(config.lambda_pair, 1.5);
        assert_eq!(config.reweighting, Reweighting::None);
    }

    #[test]
    fn builder_fails_when_parameter_is_missing() {
        let result = EvaluatorConfigBuilder::new()
            .lambda_single(0.5)
            .reweighting(Reweighting::None)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingParameter("lambda_pair"))
        ));
    }

    #[test]
    fn builder_rejects_negative_coefficient() {
        let result = EvaluatorConfigBuilder::new()
            .lambda_single(-1.0)
            .lambda_pair(0.2)
            .reweighting(Reweighting::None)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCoefficient {
                name: "lambda_single",
                ..
            })
        ));
    }

    #[test]
    fn builder_rejects_invalid_threshold() {
        let result = EvaluatorConfigBuilder::new()
            .lambda_single(0.01)
            .lambda_pair(0.2)
            .reweighting(Reweighting::Similarity { threshold: -0.1 })
            .build();
        assert!(matches!(result, Err(ConfigError::Reweighting(_))));
    }

    #[test]
    fn default_config_uses_similarity_reweighting() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.lambda_single, DEFAULT_LAMBDA_SINGLE);
        assert_eq!(config.lambda_pair, DEFAULT_LAMBDA_PAIR);
        assert_eq!(
            config.reweighting,
            Reweighting::Similarity { threshold: 0.8 }
        );
    }

    #[test]
    fn load_succeeds_with_valid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("evaluator.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            r#"
            lambda_single = 0.05
            lambda_pair = 0.3

            [reweighting]
            mode = "none"
            "#
        )
        .unwrap();

        let config = EvaluatorConfig::load(&file_path).unwrap();
        assert_eq!(config.lambda_single, 0.05);
        assert_eq!(config.lambda_pair, 0.3);
        assert_eq!(config.reweighting, Reweighting::None);
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "lambda_pair = 0.1\n").unwrap();

        let config = EvaluatorConfig::load(&file_path).unwrap();
        assert_eq!(config.lambda_single, DEFAULT_LAMBDA_SINGLE);
        assert_eq!(config.lambda_pair, 0.1);
        assert_eq!(config.reweighting, Reweighting::default());
    }

    #[test]
    fn load_fails_for_nonexistent_file() {
        let result = EvaluatorConfig::load(Path::new("no_such_evaluator_config.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        std::fs::write(&file_path, "lambda_single = [").unwrap();

        let result = EvaluatorConfig::load(&file_path);
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }
}
