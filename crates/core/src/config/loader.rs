use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("KESSAN_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[storage]
base_dir = "/data"
download_dir = "/data/incoming"

[registry]
codes_url = "https://example.com/api/codes"
result_url = "https://example.com/api/report-download"

[portal]
search_url = "https://disclosure.example.com/search"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.registry.codes_url, "https://example.com/api/codes");
    }

    #[test]
    fn test_load_config_from_str_missing_storage() {
        let toml = r#"
[registry]
codes_url = "https://example.com/api/codes"
result_url = "https://example.com/api/report-download"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[storage]
base_dir = "/data"
download_dir = "/data/incoming"

[registry]
codes_url = "https://example.com/api/codes"
result_url = "https://example.com/api/report-download"
timeout_secs = 5

[portal]
search_url = "https://disclosure.example.com/search"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.registry.timeout_secs, 5);
    }
}
