//! Cookie file loading
//!
//! Reads cookies exported in the Netscape `cookies.txt` format so a crawl can
//! reuse an existing browser session (e.g. to see attachments that are only
//! visible to logged-in forum members).

use crate::ConfigError;
use std::path::Path;
use url::Url;

/// Prefix curl and browsers use to mark HttpOnly cookies in cookie files
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// One cookie as read from a cookie file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
}

impl CookieRecord {
    /// Renders the record as a `Set-Cookie` header value
    pub fn to_set_cookie(&self) -> String {
        let mut cookie = format!("{}={}", self.name, self.value);
        if !self.domain.is_empty() {
            cookie.push_str("; Domain=");
            cookie.push_str(&self.domain);
        }
        if !self.path.is_empty() {
            cookie.push_str("; Path=");
            cookie.push_str(&self.path);
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Loads all cookies from a Netscape cookie file
pub fn load_cookie_file(path: &Path) -> Result<Vec<CookieRecord>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_cookie_file(&content).map_err(|(line, message)| ConfigError::CookieFile {
        path: path.display().to_string(),
        line,
        message,
    })
}

/// Parses the content of a Netscape cookie file
///
/// On failure the 1-based line number and a description are returned.
pub fn parse_cookie_file(content: &str) -> Result<Vec<CookieRecord>, (usize, String)> {
    let mut cookies = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let mut line = raw.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix(HTTP_ONLY_PREFIX) {
            line = rest;
        } else if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 7 {
            return Err((
                line_no,
                format!("expected 7 tab-separated fields, got {}", fields.len()),
            ));
        }

        let secure = parse_flag(fields[3]).ok_or_else(|| {
            (line_no, format!("invalid secure flag {:?}", fields[3]))
        })?;
        if fields[5].is_empty() {
            return Err((line_no, "cookie name is empty".to_string()));
        }

        cookies.push(CookieRecord {
            name: fields[5].to_string(),
            value: fields[6].to_string(),
            domain: fields[0].to_string(),
            path: fields[2].to_string(),
            secure,
        });
    }

    Ok(cookies)
}

/// Loads `cookies` into `jar` for the scheme and host of `page`
pub fn seed_jar(jar: &reqwest::cookie::Jar, cookies: &[CookieRecord], page: &Url) {
    let Some(host) = page.host_str() else {
        return;
    };
    let Ok(base) = Url::parse(&format!("{}://{}", page.scheme(), host)) else {
        return;
    };

    for cookie in cookies {
        jar.add_cookie_str(&cookie.to_set_cookie(), &base);
    }
    tracing::debug!("Seeded cookie jar with {} cookies for {}", cookies.len(), base);
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_uppercase().as_str() {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}
