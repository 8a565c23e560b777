//! File naming rules for downloads

use super::DownloadError;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::Path;
use url::Url;

/// Length of generated names for colliding sources
const RANDOM_NAME_LEN: usize = 32;

/// Extracts the file name from a `Content-Disposition` header value
///
/// Looks for a `filename="..."` parameter. Names that are empty or contain a
/// path separator are rejected.
///
/// # Examples
///
/// ```
/// use bbcrawl::download::filename_from_content_disposition;
///
/// assert_eq!(
///     filename_from_content_disposition(r#"attachment; filename="pic.jpg""#),
///     Some("pic.jpg".to_string())
/// );
/// assert_eq!(filename_from_content_disposition(r#"filename="../etc/passwd""#), None);
/// ```
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim().trim_matches('"'))
        .filter(|name| is_plain_file_name(name))
        .map(str::to_string)
}

/// Returns the percent-decoded last path segment of `url`
///
/// An empty string is returned if the path ends in `/`.
pub fn file_name_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    }
}

/// Returns the apparent file extension of the link target, without the dot
///
/// Only alphanumeric extensions count; `"/pics/a.jpg?x=1"` yields `jpg`,
/// `"/pics/a"` and `"/pics/a."` yield nothing.
pub fn apparent_extension(url: &Url) -> Option<String> {
    let name = file_name_from_url(url);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_string())
}

/// Checks that `name` can be used as a file name inside a directory
pub fn validate_file_name(name: &str) -> Result<(), DownloadError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(DownloadError::InvalidFileName {
            name: name.to_string(),
            reason: "not a file name",
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(DownloadError::InvalidFileName {
            name: name.to_string(),
            reason: "contains a directory separator",
        });
    }
    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    validate_file_name(name).is_ok()
}

/// Assigns unique file names to the sources of one media element
///
/// The same source URL always keeps the name it was first given. A source
/// whose derived name is already taken by a different URL gets a random
/// alphanumeric name that keeps the original extension.
#[derive(Debug, Default)]
pub struct NameTable {
    entries: Vec<(Url, String)>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `src` and returns the name assigned to it
    pub fn add(&mut self, src: &Url) -> Result<&str, DownloadError> {
        if let Some(index) = self.entries.iter().position(|(url, _)| url == src) {
            return Ok(&self.entries[index].1);
        }

        let derived = file_name_from_url(src);
        if derived.is_empty() {
            return Err(DownloadError::InvalidFileName {
                name: src.path().to_string(),
                reason: "could not derive a file name from the URL path",
            });
        }
        validate_file_name(&derived)?;

        let mut name = derived.clone();
        while self.is_taken(&name) {
            name = random_name(&derived);
        }

        self.entries.push((src.clone(), name));
        Ok(&self.entries[self.entries.len() - 1].1)
    }

    /// Registered sources with their names, in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&Url, &str)> {
        self.entries.iter().map(|(url, name)| (url, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_taken(&self, name: &str) -> bool {
        self.entries.iter().any(|(_, taken)| taken == name)
    }
}

/// Generates a random alphanumeric name keeping the extension of `original`
fn random_name(original: &str) -> String {
    let mut name: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(char::from)
        .collect();
    if let Some(ext) = Path::new(original).extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    name
}
