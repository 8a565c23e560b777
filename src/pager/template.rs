use super::{
    not_configured, parse_generated, url_for_pager, PageRange, PageRangeArgs, Pager, PAGER_FORMAT,
};
use crate::cli::parse_options;
use crate::{ConfigError, ConfigResult, CrawlError};
use url::Url;

/// An address split around the place where the page value goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    left: String,
    right: String,
    width: usize,
}

impl UrlTemplate {
    /// Template inserting the value between `left` and `right`, zero-padded
    /// to `width` digits (0 disables padding)
    pub fn new(left: impl Into<String>, right: impl Into<String>, width: usize) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            width,
        }
    }

    /// Parses a printf-style template holding exactly one `%d` or `%0<w>d`
    /// directive; `%%` stands for a literal percent sign
    ///
    /// # Examples
    ///
    /// ```
    /// use bbcrawl::pager::UrlTemplate;
    ///
    /// let template = UrlTemplate::parse("http://forum.example/t-%03d.html").unwrap();
    /// assert_eq!(template.render(7), "http://forum.example/t-007.html");
    /// ```
    pub fn parse(format: &str) -> Result<Self, String> {
        let mut left = String::new();
        let mut right = String::new();
        let mut width = None;
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if width.is_some() { &mut right } else { &mut left };
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => out.push('%'),
                Some('d') if width.is_none() => width = Some(0),
                Some('0') if width.is_none() => {
                    let mut digits = String::new();
                    while let Some(d) = chars.next_if(char::is_ascii_digit) {
                        digits.push(d);
                    }
                    if chars.next() != Some('d') || digits.is_empty() {
                        return Err(format!("malformed directive in {:?}", format));
                    }
                    let w = digits
                        .parse()
                        .map_err(|_| format!("directive width out of range in {:?}", format))?;
                    width = Some(w);
                }
                Some('d' | '0') => {
                    return Err(format!("more than one directive in {:?}", format));
                }
                other => {
                    return Err(format!(
                        "unsupported directive %{} in {:?}",
                        other.map(String::from).unwrap_or_default(),
                        format
                    ));
                }
            }
        }

        match width {
            Some(width) => Ok(Self { left, right, width }),
            None => Err(format!("no %d directive in {:?}", format)),
        }
    }

    pub fn render(&self, value: i64) -> String {
        format!("{}{:0width$}{}", self.left, value, self.right, width = self.width)
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

/// Options shared by the template based pagers
#[derive(Debug, Clone, clap::Args)]
pub(super) struct TemplateArgs {
    #[command(flatten)]
    pub range: PageRangeArgs,

    /// Multiplier applied to the page counter before it is put into the URL
    #[arg(long, default_value_t = 1)]
    pub step: i64,

    /// Offset added to the page number reported to the crawler
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub adjust: i64,

    /// URL visited once before the templated pages
    #[arg(long)]
    pub startpage: Option<String>,
}

/// Outcome of advancing a [`PageSequence`]
pub(super) enum Step {
    Start(Url),
    Value(i64),
    Done,
}

/// Counter driving the template based pagers
#[derive(Debug, Clone)]
pub(super) struct PageSequence {
    range: PageRange,
    step: i64,
    adjust: i64,
    startpage: Option<Url>,
    page: i64,
}

impl PageSequence {
    pub fn from_args(component: &str, args: &TemplateArgs) -> ConfigResult<Self> {
        let range = args.range.range(component)?;
        if args.step < 1 {
            return Err(ConfigError::options(
                component,
                format!("step must be at least 1, got {}", args.step),
            ));
        }
        let startpage = args
            .startpage
            .as_deref()
            .map(url_for_pager)
            .transpose()
            .map_err(|e| ConfigError::options(component, format!("startpage: {}", e)))?;

        Ok(Self {
            range,
            step: args.step,
            adjust: args.adjust,
            startpage,
            page: range.start,
        })
    }

    /// Largest value a template will be rendered with
    pub fn max_value(&self) -> i64 {
        self.range.end.saturating_mul(self.step)
    }

    pub fn advance(&mut self) -> Step {
        if let Some(url) = self.startpage.take() {
            return Step::Start(url);
        }
        if self.page > self.range.end {
            return Step::Done;
        }
        let value = self.page * self.step;
        self.page += 1;
        Step::Value(value)
    }

    pub fn page_num(&self) -> i64 {
        self.page - 1 + self.adjust
    }
}

/// Advances `sequence` and renders the next URL through `template`
pub(super) fn next_from_template(
    sequence: &mut PageSequence,
    template: &UrlTemplate,
) -> Result<Option<Url>, CrawlError> {
    match sequence.advance() {
        Step::Start(url) => Ok(Some(url)),
        Step::Value(value) => parse_generated(&template.render(value)).map(Some),
        Step::Done => Ok(None),
    }
}

#[derive(Debug, clap::Parser)]
struct FormatOptions {
    #[command(flatten)]
    template: TemplateArgs,
}

/// Paging through a printf-style URL template
#[derive(Debug, Default)]
pub struct FormatPager {
    sequence: Option<PageSequence>,
    template: Option<UrlTemplate>,
}

impl Pager for FormatPager {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: FormatOptions = parse_options(PAGER_FORMAT, args)?;
        self.sequence = Some(PageSequence::from_args(PAGER_FORMAT, &options.template)?);
        Ok(())
    }

    fn set_url(&mut self, addr: &str) -> ConfigResult<()> {
        let sequence = self
            .sequence
            .as_ref()
            .ok_or_else(|| {
                ConfigError::options(PAGER_FORMAT, "options must be set before the URL")
            })?;
        let template = UrlTemplate::parse(addr).map_err(ConfigError::InvalidUrl)?;
        url_for_pager(&template.render(sequence.max_value()))?;
        self.template = Some(template);
        Ok(())
    }

    fn next_url(&mut self) -> Result<Option<Url>, CrawlError> {
        let (Some(sequence), Some(template)) = (self.sequence.as_mut(), self.template.as_ref())
        else {
            return Err(not_configured(PAGER_FORMAT));
        };
        next_from_template(sequence, template)
    }

    fn page_num(&self) -> i64 {
        self.sequence.as_ref().map_or(0, PageSequence::page_num)
    }
}
