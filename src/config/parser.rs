use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config.crawl)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlSettings;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawl]
output = "downloads"
jobs = 3
timeout-secs = 10
user-agent = "TestCrawler/1.0"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawl.jobs, Some(3));
        assert_eq!(config.crawl.timeout_secs, Some(10));
        assert_eq!(config.crawl.user_agent.as_deref(), Some("TestCrawler/1.0"));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert!(config.crawl.jobs.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/bbcrawl.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[crawl]\njobs = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_resolve_relative_output() {
        let cwd = tempfile::tempdir().unwrap();
        std::fs::create_dir(cwd.path().join("out")).unwrap();

        let file = create_temp_config("[crawl]\noutput = \"out\"\n");
        let config = load_config(file.path()).unwrap();
        let settings = CrawlSettings::resolve(config.crawl, cwd.path()).unwrap();

        assert_eq!(settings.output, cwd.path().join("out"));
        assert_eq!(settings.jobs, crate::config::DEFAULT_DL_JOBS);
    }

    #[test]
    fn test_command_line_overrides_file() {
        let cwd = tempfile::tempdir().unwrap();
        let file = create_temp_config("[crawl]\njobs = 3\ntimeout-secs = 7\n");
        let config = load_config(file.path()).unwrap();

        let overrides = crate::config::CrawlConfig {
            jobs: Some(9),
            ..Default::default()
        };
        let settings = CrawlSettings::resolve(config.crawl.merge(overrides), cwd.path()).unwrap();

        assert_eq!(settings.jobs, 9);
        assert_eq!(settings.timeout.as_secs(), 7);
    }
}
