//! Option parsing shared by all crawlers

use crate::html::AttrPair;
use url::Url;

const PAIR_SEPARATOR: char = '/';
const ESCAPE: char = '\\';
const KEY_VALUE_SEPARATOR: char = '=';
const VALUE_SEPARATOR: char = ',';

/// Options every crawler accepts
#[derive(Debug, Clone, clap::Args)]
pub struct CommonArgs {
    /// Comma-separated list of URLs that won't be downloaded
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<Url>,

    /// Allow (true) or deny (false) redirects
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub redirect: bool,

    /// Dump the headers of every page request into the output directory
    #[arg(long)]
    pub debug: bool,
}

/// Attribute pairs an element must carry to be crawled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrFilter(pub Vec<AttrPair>);

/// Parses an attribute filter like `class=pic,big/data-kind=photo`
///
/// Pairs are separated by `/`, `\` escapes the next character. A value list
/// separated by `,` expands to one required pair per value. Every key may
/// appear only once.
///
/// # Examples
///
/// ```
/// use bbcrawl::crawler::parse_attrs;
///
/// let filter = parse_attrs("class=pic/alt=a\\/b").unwrap();
/// assert_eq!(
///     filter.0,
///     vec![
///         ("class".to_string(), "pic".to_string()),
///         ("alt".to_string(), "a/b".to_string()),
///     ]
/// );
/// ```
pub fn parse_attrs(s: &str) -> Result<AttrFilter, String> {
    let mut keys: Vec<String> = Vec::new();
    let mut pairs = Vec::new();

    for pair in split_escaped(s)? {
        let Some((key, values)) = pair.split_once(KEY_VALUE_SEPARATOR) else {
            return Err(format!("Substring {:?}: less or more than one equal sign", pair));
        };
        if keys.iter().any(|k| k == key) {
            return Err(format!("Key {:?} used twice", key));
        }
        keys.push(key.to_string());
        for value in values.split(VALUE_SEPARATOR) {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    Ok(AttrFilter(pairs))
}

/// Splits at unescaped pair separators, resolving escapes
fn split_escaped(s: &str) -> Result<Vec<String>, String> {
    if s.is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().enumerate();
    while let Some((i, c)) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some((_, escaped)) => current.push(escaped),
                None => {
                    return Err(format!(
                        "Index {}: unexpected end after escape character",
                        i + 1
                    ))
                }
            },
            PAIR_SEPARATOR => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    Ok(parts)
}
