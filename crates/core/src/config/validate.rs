use super::{types::Config, ConfigError};

/// Validate a loaded configuration before wiring anything up.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.storage.base_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("storage.base_dir is empty".into()));
    }
    if config.storage.download_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("storage.download_dir is empty".into()));
    }

    for (name, url) in [
        ("registry.codes_url", &config.registry.codes_url),
        ("registry.result_url", &config.registry.result_url),
        ("webdriver.url", &config.webdriver.url),
        ("portal.search_url", &config.portal.search_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "{} must be an http(s) URL, got {:?}",
                name, url
            )));
        }
    }

    if config.portal.download.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "portal.download.poll_interval_ms must be > 0".into(),
        ));
    }

    config
        .pacing
        .validate()
        .map_err(|e| ConfigError::Invalid(format!("pacing: {}", e)))?;

    Ok(())
}
