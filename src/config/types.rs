use crate::cookies::{load_cookie_file, CookieRecord};
use crate::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of downloads running at the same time unless configured otherwise
pub const DEFAULT_DL_JOBS: usize = 5;

/// Upper bound accepted for the download pool size
pub const MAX_DL_JOBS: usize = 100;

/// Per-request transport timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level structure of a bbcrawl TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
}

/// Global crawl options as written in a config file or on the command line
///
/// Every field is optional so that layers can be merged; missing values fall
/// back to the defaults when resolved into [`CrawlSettings`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Output directory for downloaded files
    pub output: Option<PathBuf>,

    /// Maximum number of concurrent downloads
    pub jobs: Option<usize>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// User agent sent with every request
    pub user_agent: Option<String>,

    /// Netscape cookie file to seed the cookie jar with
    pub cookie_file: Option<PathBuf>,
}

impl CrawlConfig {
    /// Overlays `overrides` on top of `self`; set values in `overrides` win
    pub fn merge(self, overrides: CrawlConfig) -> CrawlConfig {
        CrawlConfig {
            output: overrides.output.or(self.output),
            jobs: overrides.jobs.or(self.jobs),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
            user_agent: overrides.user_agent.or(self.user_agent),
            cookie_file: overrides.cookie_file.or(self.cookie_file),
        }
    }
}

/// Resolved, validated process-wide settings of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Absolute path of the output directory
    pub output: PathBuf,

    /// Download pool size
    pub jobs: usize,

    /// Transport timeout applied to every request
    pub timeout: Duration,

    /// User agent header value
    pub user_agent: String,

    /// Cookies loaded at startup, seeded into the jar on the first page fetch
    pub cookies: Vec<CookieRecord>,
}

impl CrawlSettings {
    /// Default settings writing into `output`
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            jobs: DEFAULT_DL_JOBS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
            cookies: Vec::new(),
        }
    }

    /// Validates `config` and turns it into settings
    ///
    /// Relative output paths are resolved against `cwd`; when no output
    /// directory is configured, `cwd` itself is used. The cookie file, if
    /// any, is loaded here.
    pub fn resolve(config: CrawlConfig, cwd: &Path) -> Result<Self, ConfigError> {
        super::validation::validate(&config)?;

        let output = match config.output {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        };
        super::validation::validate_output_dir(&output)?;

        let cookies = match &config.cookie_file {
            Some(path) => load_cookie_file(path)?,
            None => Vec::new(),
        };

        Ok(Self {
            output,
            jobs: config.jobs.unwrap_or(DEFAULT_DL_JOBS),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            user_agent: config.user_agent.unwrap_or_else(default_user_agent),
            cookies,
        })
    }
}

fn default_user_agent() -> String {
    format!("bbcrawl/{}", env!("CARGO_PKG_VERSION"))
}
