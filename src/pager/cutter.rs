use super::template::{next_from_template, PageSequence, TemplateArgs};
use super::{not_configured, url_for_pager, Pager, UrlTemplate, PAGER_URLCUT};
use crate::cli::parse_options;
use crate::{ConfigError, ConfigResult, CrawlError};
use url::Url;

/// Character positions `first,last` of the cut, 1-based and inclusive
fn parse_cut(s: &str) -> Result<(i64, i64), String> {
    let (first, last) = s
        .split_once(',')
        .ok_or_else(|| "expected two integers separated by a comma".to_string())?;
    let first: i64 = first.trim().parse().map_err(|e| format!("{:?}: {}", first, e))?;
    let last: i64 = last.trim().parse().map_err(|e| format!("{:?}: {}", last, e))?;
    if first == 0 || last == 0 {
        return Err("positions are 1-based, 0 is not allowed".to_string());
    }
    Ok((first, last))
}

#[derive(Debug, clap::Parser)]
struct CutterOptions {
    #[command(flatten)]
    template: TemplateArgs,

    /// Range of characters in the URL to replace with the page number
    #[arg(long, value_parser = parse_cut, allow_hyphen_values = true)]
    cut: (i64, i64),

    /// Zero-pad page numbers to this many digits (0: no padding)
    #[arg(long, default_value_t = 0)]
    digits: usize,
}

/// Paging by cutting a part out of the thread URL and putting the page
/// number in its place
///
/// Cut positions count characters of the URL as given, starting at 1;
/// negative positions count from the end, `-1` being the last character.
/// The last position is clamped to the length of the URL.
#[derive(Debug, Default)]
pub struct CuttingPager {
    sequence: Option<PageSequence>,
    cut: (i64, i64),
    digits: usize,
    template: Option<UrlTemplate>,
}

impl CuttingPager {
    fn split(&self, addr: &str) -> ConfigResult<UrlTemplate> {
        let chars: Vec<char> = addr.chars().collect();
        let len = chars.len() as i64;
        let resolve = |pos: i64| if pos < 0 { len + pos + 1 } else { pos };

        let first = resolve(self.cut.0);
        let last = resolve(self.cut.1).min(len);
        if first < 1 || first > len {
            return Err(ConfigError::options(PAGER_URLCUT, "cut: index out of range"));
        }
        if last < first {
            return Err(ConfigError::options(
                PAGER_URLCUT,
                "cut: last position lies before the first one",
            ));
        }

        let left: String = chars[..(first - 1) as usize].iter().collect();
        let right: String = chars[last as usize..].iter().collect();
        Ok(UrlTemplate::new(left, right, self.digits))
    }
}

impl Pager for CuttingPager {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: CutterOptions = parse_options(PAGER_URLCUT, args)?;
        let sequence = PageSequence::from_args(PAGER_URLCUT, &options.template)?;
        if options.digits > 0 && options.digits < sequence.max_value().to_string().len() {
            return Err(ConfigError::options(
                PAGER_URLCUT,
                "digits: not enough space to hold the desired page numbers",
            ));
        }

        self.sequence = Some(sequence);
        self.cut = options.cut;
        self.digits = options.digits;
        Ok(())
    }

    fn set_url(&mut self, addr: &str) -> ConfigResult<()> {
        if self.sequence.is_none() {
            return Err(ConfigError::options(
                PAGER_URLCUT,
                "options must be set before the URL",
            ));
        }
        url_for_pager(addr)?;
        self.template = Some(self.split(addr)?);
        Ok(())
    }

    fn next_url(&mut self) -> Result<Option<Url>, CrawlError> {
        let (Some(sequence), Some(template)) = (self.sequence.as_mut(), self.template.as_ref())
        else {
            return Err(not_configured(PAGER_URLCUT));
        };
        next_from_template(sequence, template)
    }

    fn page_num(&self) -> i64 {
        self.sequence.as_ref().map_or(0, PageSequence::page_num)
    }
}
