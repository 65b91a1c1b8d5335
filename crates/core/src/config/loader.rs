use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{doc_types::apply_legacy_doc_types, types::Config, ConfigError};

/// Prefix of environment overrides. Nested keys are separated by `__`,
/// e.g. `PAYFLOW_PIPELINE__COUNTRY_CODE=CL`.
pub const ENV_PREFIX: &str = "PAYFLOW_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let mut config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    apply_legacy_doc_types(&mut config)?;
    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let mut config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    apply_legacy_doc_types(&mut config)?;
    Ok(config)
}
