use super::{types::Config, ConfigError};

/// Validate configuration
///
/// Checks the cross-field rules that serde defaults cannot express:
/// - server port is not 0
/// - chunk size and file size ceiling are positive
/// - Graph credentials are present when auto-upload is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.upload.chunk_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.chunk_size_bytes cannot be 0".to_string(),
        ));
    }

    if config.upload.max_file_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_file_size_bytes cannot be 0".to_string(),
        ));
    }

    if config.upload.auto_upload {
        if config.graph.access_token.is_empty() {
            return Err(ConfigError::ValidationError(
                "graph.access_token is required when upload.auto_upload is enabled".to_string(),
            ));
        }
        if config.graph.target_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "graph.target_id is required when upload.auto_upload is enabled".to_string(),
            ));
        }
    }

    if config.extractor.binary_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "extractor.binary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
