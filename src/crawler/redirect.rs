//! Redirect policies for page and download requests

use reqwest::redirect::{Attempt, Policy};

/// Hops followed before a request fails
pub const MAX_REDIRECTS: usize = 10;

/// How a crawler's client reacts to HTTP redirects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Follow redirects, logging every hop
    #[default]
    Log,
    /// Fail on the first redirect
    Deny,
}

impl RedirectPolicy {
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed {
            Self::Log
        } else {
            Self::Deny
        }
    }

    /// Builds the `reqwest` policy implementing `self`
    pub fn policy(self) -> Policy {
        match self {
            Self::Log => Policy::custom(log_redirect),
            Self::Deny => Policy::custom(deny_redirect),
        }
    }
}

fn log_redirect(attempt: Attempt) -> reqwest::redirect::Action {
    if attempt.previous().len() > MAX_REDIRECTS {
        return attempt.error("Too many redirects");
    }
    if let Some(last) = attempt.previous().last() {
        tracing::info!("Redirection: {:?} → {:?}", last.as_str(), attempt.url().as_str());
    }
    attempt.follow()
}

fn deny_redirect(attempt: Attempt) -> reqwest::redirect::Action {
    let from = attempt
        .previous()
        .last()
        .map(|url| url.to_string())
        .unwrap_or_default();
    let message = format!("Attempted Redirection: {:?} → {:?}", from, attempt.url().as_str());
    attempt.error(message)
}
