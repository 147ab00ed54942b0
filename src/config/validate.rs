//! Configuration validation.

use crate::audio::validate_segmentation;
use crate::config::{Config, DefaultsConfig, ModelConfig};
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(&config.defaults)?;
    if config.model.input_width == 0 || config.model.input_height == 0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "model input size must be positive, got {}x{}",
                config.model.input_width, config.model.input_height
            ),
        });
    }
    Ok(())
}

/// Validate analysis settings.
pub fn validate_defaults(defaults: &DefaultsConfig) -> Result<()> {
    validate_segmentation(defaults.segment_duration, defaults.overlap)?;

    if defaults.noise_weight.is_nan() || defaults.noise_weight < 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "noise_weight must be non-negative, got {}",
                defaults.noise_weight
            ),
        });
    }

    if defaults.files_per_batch == 0 {
        return Err(Error::ConfigValidation {
            message: "files_per_batch must be at least 1".to_string(),
        });
    }

    if defaults.workers == Some(0) {
        return Err(Error::ConfigValidation {
            message: "workers must be at least 1".to_string(),
        });
    }

    if defaults.merge_threshold_ms < 0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "merge_threshold_ms must be non-negative, got {}",
                defaults.merge_threshold_ms
            ),
        });
    }

    Ok(())
}

/// Resolve the model and labels paths, checking both files exist.
pub fn resolve_model_files(model: &ModelConfig) -> Result<(PathBuf, PathBuf)> {
    let path = model.path.clone().ok_or_else(|| Error::ConfigValidation {
        message: "no model specified (use --model or set model.path in config)".to_string(),
    })?;
    let labels = model.labels.clone().ok_or_else(|| Error::ConfigValidation {
        message: "no labels file specified (use --labels or set model.labels in config)"
            .to_string(),
    })?;

    if !path.exists() {
        return Err(Error::ModelFileNotFound { path });
    }
    if !labels.exists() {
        return Err(Error::LabelsFileNotFound { path: labels });
    }
    Ok((path, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_overlap_not_below_duration() {
        let mut config = Config::default();
        config.defaults.overlap = 1.0;
        assert!(matches!(
            validate_config(&config),
            Err(Error::InvalidSegmentation { .. })
        ));
    }

    #[test]
    fn test_validate_negative_overlap() {
        let mut config = Config::default();
        config.defaults.overlap = -0.1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_negative_noise_weight() {
        let mut config = Config::default();
        config.defaults.noise_weight = -1.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_files_per_batch() {
        let mut config = Config::default();
        config.defaults.files_per_batch = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_workers() {
        let mut config = Config::default();
        config.defaults.workers = Some(0);
        assert!(validate_config(&config).is_err());
        config.defaults.workers = Some(2);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_input_size() {
        let mut config = Config::default();
        config.model.input_width = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_resolve_missing_model_path() {
        let model = ModelConfig::default();
        assert!(matches!(
            resolve_model_files(&model),
            Err(Error::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_resolve_nonexistent_model_file() {
        let model = ModelConfig {
            path: Some(PathBuf::from("/nonexistent/model.onnx")),
            labels: Some(PathBuf::from("/nonexistent/labels.txt")),
            ..ModelConfig::default()
        };
        assert!(matches!(
            resolve_model_files(&model),
            Err(Error::ModelFileNotFound { .. })
        ));
    }
}
