use crate::config::types::{CrawlConfig, MAX_DL_JOBS};
use crate::ConfigError;
use std::path::Path;

/// Validates the global crawl options
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    if let Some(jobs) = config.jobs {
        if !(1..=MAX_DL_JOBS).contains(&jobs) {
            return Err(ConfigError::Validation(format!(
                "jobs must be between 1 and {}, got {}",
                MAX_DL_JOBS, jobs
            )));
        }
    }

    if config.timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Checks that the output directory is absolute and exists as a directory
pub fn validate_output_dir(dir: &Path) -> Result<(), ConfigError> {
    if !dir.is_absolute() {
        return Err(ConfigError::Validation(format!(
            "output directory must be absolute: {}",
            dir.display()
        )));
    }

    let meta = std::fs::metadata(dir).map_err(|e| {
        ConfigError::Validation(format!("output directory {}: {}", dir.display(), e))
    })?;
    if !meta.is_dir() {
        return Err(ConfigError::Validation(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_jobs() {
        let mut config = CrawlConfig::default();
        assert!(validate(&config).is_ok());

        config.jobs = Some(5);
        assert!(validate(&config).is_ok());

        config.jobs = Some(0);
        assert!(validate(&config).is_err());

        config.jobs = Some(MAX_DL_JOBS + 1);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_timeout_and_agent() {
        let config = CrawlConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(validate(&config).is_err());

        let config = CrawlConfig {
            user_agent: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_output_dir(dir.path()).is_ok());
        assert!(validate_output_dir(Path::new("relative/dir")).is_err());
        assert!(validate_output_dir(&dir.path().join("missing")).is_err());

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(validate_output_dir(&file).is_err());
    }
}
