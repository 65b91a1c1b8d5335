use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Country code and prefix are set
/// - Ok and error statuses differ
/// - At least one document type is configured
/// - Every downstream target is named
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let pipeline = &config.pipeline;
    if pipeline.country_code.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.country_code cannot be empty".to_string(),
        ));
    }
    if pipeline.prefix.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.prefix cannot be empty".to_string(),
        ));
    }
    if pipeline.status_ok == pipeline.status_error {
        return Err(ConfigError::ValidationError(format!(
            "pipeline.status_ok and pipeline.status_error are both '{}'",
            pipeline.status_ok
        )));
    }

    if config.doc_types.is_empty() {
        return Err(ConfigError::ValidationError(
            "doc_types must name at least one document type".to_string(),
        ));
    }
    if let Some(bad) = config.doc_types.keys().find(|d| d.is_empty() || d.contains('-')) {
        return Err(ConfigError::ValidationError(format!(
            "doc type '{}' must be non-empty and contain no '-'",
            bad
        )));
    }

    for (role, target) in config.targets.entries() {
        if target.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "targets.{} cannot be empty",
                role
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::config::types::tests::MINIMAL_TOML;

    fn config() -> Config {
        load_config_from_str(MINIMAL_TOML).unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_country_fails() {
        let mut config = config();
        config.pipeline.country_code = " ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_same_statuses_fails() {
        let mut config = config();
        config.pipeline.status_error = "OK".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("'OK'"));
    }

    #[test]
    fn test_validate_no_doc_types_fails() {
        let mut config = config();
        config.doc_types.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_dashed_doc_type_fails() {
        let mut config = config();
        config.doc_types.insert("credit-note".to_string(), 1);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_missing_target_fails() {
        let mut config = config();
        config.targets.delete_queues = String::new();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("targets.delete_queues"));
    }
}
