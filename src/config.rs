//! Configuration management for the jet tagging pipeline

use crate::feature_extractor::{particle_transformer_inputs, InputSpec, DEFAULT_SLOT_LENGTH};
use crate::types::event::SelectionCuts;
use crate::types::record::OutputLayout;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub preprocessing: PreprocessingConfig,
    pub selection: SelectionCuts,
    pub output: OutputLayout,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub path: PathBuf,
    /// Number of intra-op threads for ONNX inference (default: 1)
    pub onnx_threads: usize,
    /// Output to return; the first declared output when unset
    pub output_name: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/part_sophon.onnx"),
            onnx_threads: 1,
            output_name: None,
        }
    }
}

/// Tensor layout the preprocessor packs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Particle slots per tensor
    pub slot_length: usize,
    /// Network inputs in binding order, each with its ordered channels
    pub inputs: Vec<InputSpec>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            slot_length: DEFAULT_SLOT_LENGTH,
            inputs: particle_transformer_inputs(),
        }
    }
}

/// Pipeline run configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dump packed tensors and raw outputs at debug level
    pub debug: bool,
    /// Stop after this many events; all events when unset
    pub max_events: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::Feature;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.preprocessing.slot_length, 128);
        assert_eq!(config.preprocessing.inputs.len(), 3);
        assert_eq!(config.output.len(), 316);
        assert!(!config.pipeline.debug);
        assert_eq!(config.pipeline.max_events, None);
        assert_eq!(config.selection.max_abs_eta, 5.0);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = write_config(
            r#"
[model]
path = "models/other.onnx"
onnx_threads = 4

[pipeline]
max_events = 10
"#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model.path, PathBuf::from("models/other.onnx"));
        assert_eq!(config.model.onnx_threads, 4);
        assert_eq!(config.pipeline.max_events, Some(10));
        assert_eq!(config.preprocessing.inputs, particle_transformer_inputs());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_custom_channels() {
        let file = write_config(
            r#"
[preprocessing]
slot_length = 16

[[preprocessing.inputs]]
name = "pf_mask"

[[preprocessing.inputs.channels]]
feature = "part_mask"
subtract = 0.0
multiply = 1.0
clip_min = 0.0
clip_max = 1.0
"#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.preprocessing.slot_length, 16);
        assert_eq!(config.preprocessing.inputs.len(), 1);
        assert_eq!(config.preprocessing.inputs[0].channels[0].feature, Feature::Mask);
    }

    #[test]
    fn test_unknown_feature_rejected() {
        let file = write_config(
            r#"
[[preprocessing.inputs]]
name = "pf_features"

[[preprocessing.inputs.channels]]
feature = "part_unknown"
subtract = 0.0
multiply = 1.0
clip_min = -1.0
clip_max = 1.0
"#,
        );

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("part_unknown"));
    }
}
