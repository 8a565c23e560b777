//! Command line plumbing shared by the binary and the strategy families
//!
//! A bbcrawl invocation looks like
//!
//! ```text
//! bbcrawl [GLOBAL] <pager> [PAGER-OPTS] --crawler <crawler> [CRAWLER-OPTS] <thread-url>
//! ```
//!
//! The global options are handled by the binary. Everything after them is
//! split by [`Invocation::partition`]; the pager and crawler tokens are then
//! parsed by each strategy with [`parse_options`].

use crate::ConfigError;

/// Token introducing the crawler part of an invocation
pub const CRAWLER_SWITCH: &str = "--crawler";

/// The strategy part of a command line, split into its pieces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub pager: String,
    pub pager_args: Vec<String>,
    pub crawler: String,
    pub crawler_args: Vec<String>,
    pub url: String,
}

impl Invocation {
    /// Splits `tokens` into pager name, pager tokens, crawler name, crawler
    /// tokens and the thread URL (always the last token)
    ///
    /// # Examples
    ///
    /// ```
    /// use bbcrawl::cli::Invocation;
    ///
    /// let tokens: Vec<String> = "vb4 --start 1 --end 3 --crawler img https://forum.example/t"
    ///     .split(' ')
    ///     .map(String::from)
    ///     .collect();
    /// let inv = Invocation::partition(&tokens).unwrap();
    /// assert_eq!(inv.pager, "vb4");
    /// assert_eq!(inv.pager_args, vec!["--start", "1", "--end", "3"]);
    /// assert_eq!(inv.crawler, "img");
    /// assert!(inv.crawler_args.is_empty());
    /// assert_eq!(inv.url, "https://forum.example/t");
    /// ```
    pub fn partition(tokens: &[String]) -> Result<Self, ConfigError> {
        let (pager, rest) = tokens
            .split_first()
            .ok_or_else(|| ConfigError::CommandLine("No pager found".to_string()))?;
        if pager.starts_with('-') {
            return Err(ConfigError::CommandLine(format!(
                "Expected a pager name, got {:?}",
                pager
            )));
        }

        let switch = rest
            .iter()
            .position(|token| token == CRAWLER_SWITCH)
            .ok_or_else(|| ConfigError::CommandLine("No crawler found".to_string()))?;
        let pager_args = rest[..switch].to_vec();

        let (crawler, rest) = rest[switch + 1..].split_first().ok_or_else(|| {
            ConfigError::CommandLine(format!("Unexpected end after {:?}", CRAWLER_SWITCH))
        })?;
        if crawler.starts_with('-') {
            return Err(ConfigError::CommandLine(format!(
                "Expected a crawler name, got {:?}",
                crawler
            )));
        }

        let (url, crawler_args) = rest
            .split_last()
            .ok_or_else(|| ConfigError::CommandLine("No URL found".to_string()))?;

        Ok(Self {
            pager: pager.clone(),
            pager_args,
            crawler: crawler.clone(),
            crawler_args: crawler_args.to_vec(),
            url: url.clone(),
        })
    }
}

/// Parses the option tokens of a pager or crawler named `component`
pub fn parse_options<T: clap::Parser>(component: &str, args: &[String]) -> Result<T, ConfigError> {
    T::try_parse_from(std::iter::once(component.to_string()).chain(args.iter().cloned()))
        .map_err(|e| ConfigError::options(component, e.to_string().trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_partition_full() {
        let inv = Invocation::partition(&tokens(
            "cutter --start 1 --end 9 --cut 24,24 --crawler src --tags img,video --redirect false http://x.net/1",
        ))
        .unwrap();

        assert_eq!(inv.pager, "cutter");
        assert_eq!(inv.pager_args, tokens("--start 1 --end 9 --cut 24,24"));
        assert_eq!(inv.crawler, "src");
        assert_eq!(inv.crawler_args, tokens("--tags img,video --redirect false"));
        assert_eq!(inv.url, "http://x.net/1");
    }

    #[test]
    fn test_partition_without_options() {
        let inv = Invocation::partition(&tokens("vb4 --crawler file http://x.net/t")).unwrap();
        assert!(inv.pager_args.is_empty());
        assert!(inv.crawler_args.is_empty());
    }

    #[test]
    fn test_partition_errors() {
        assert!(Invocation::partition(&[]).is_err());
        assert!(Invocation::partition(&tokens("vb4 --start 1")).is_err());
        assert!(Invocation::partition(&tokens("vb4 --crawler")).is_err());
        assert!(Invocation::partition(&tokens("vb4 --crawler img")).is_err());
        assert!(Invocation::partition(&tokens("--start 1 --crawler img http://x")).is_err());
    }

    #[derive(clap::Parser, Debug)]
    struct Sample {
        #[arg(long)]
        start: i64,
    }

    #[test]
    fn test_parse_options() {
        let parsed: Sample = parse_options("sample", &tokens("--start 4")).unwrap();
        assert_eq!(parsed.start, 4);

        let err = parse_options::<Sample>("sample", &tokens("--start x")).unwrap_err();
        assert!(matches!(err, ConfigError::Options { ref component, .. } if component == "sample"));

        assert!(parse_options::<Sample>("sample", &[]).is_err());
    }
}
