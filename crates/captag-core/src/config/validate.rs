//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.url.trim().is_empty() {
            return Err(ConfigError::ValidationError("api.url must not be empty".into()));
        }
        if self.api.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.model must not be empty".into(),
            ));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_ms must be > 0".into(),
            ));
        }
        if self.api.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "api.max_retries must be > 0".into(),
            ));
        }
        if self.processing.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "processing.batch_size must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.processing.payload_quality) {
            return Err(ConfigError::ValidationError(
                "processing.payload_quality must be between 1 and 100".into(),
            ));
        }
        if !(1..=100).contains(&self.metadata.jpeg_quality) {
            return Err(ConfigError::ValidationError(
                "metadata.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.metadata.min_tags == 0 {
            return Err(ConfigError::ValidationError(
                "metadata.min_tags must be > 0".into(),
            ));
        }
        if self.metadata.min_tags > self.metadata.max_tags {
            return Err(ConfigError::ValidationError(
                "metadata.min_tags must not exceed metadata.max_tags".into(),
            ));
        }
        if self.metadata.max_caption_length == 0 {
            return Err(ConfigError::ValidationError(
                "metadata.max_caption_length must be > 0".into(),
            ));
        }
        if self.output.report_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "output.report_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let mut config = Config::default();
        config.api.max_retries = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = Config::default();
        config.processing.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_validate_rejects_quality_out_of_range() {
        let mut config = Config::default();
        config.metadata.jpeg_quality = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jpeg_quality"));

        let mut config = Config::default();
        config.processing.payload_quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("payload_quality"));
    }

    #[test]
    fn test_validate_rejects_inverted_tag_bounds() {
        let mut config = Config::default();
        config.metadata.min_tags = 11;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_tags"));
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = Config::default();
        config.api.model = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api.model"));
    }
}
