//! HTML page helpers for the login, submit and profile pages

use crate::error::SubmitError;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Marker the login form renders next to the password field on failure
pub(crate) const PASSWORD_ERROR_MARKER: &str = "error for__password";

/// Marker the submit form renders when the same source was sent before
pub(crate) const DUPLICATE_SUBMISSION_MARKER: &str =
    "You have submitted exactly the same code before";

/// Parser for judge HTML pages with cached regex patterns and selectors
#[derive(Debug, Default)]
pub(crate) struct PageParser {
    csrf_selector: OnceLock<Selector>,
    password_error_selector: OnceLock<Selector>,
    form_error_selector: OnceLock<Selector>,
    header_selector: OnceLock<Selector>,
    profile_link_regex: OnceLock<Regex>,
    profile_location_regex: OnceLock<Regex>,
}

impl PageParser {
    /// Create a new parser with uninitialized caches
    pub fn new() -> Self {
        Self::default()
    }

    fn csrf_selector(&self) -> &Selector {
        self.csrf_selector
            .get_or_init(|| Selector::parse("input[name=csrf_token]").unwrap())
    }

    fn password_error_selector(&self) -> &Selector {
        self.password_error_selector
            .get_or_init(|| Selector::parse("span.error.for__password").unwrap())
    }

    fn form_error_selector(&self) -> &Selector {
        self.form_error_selector
            .get_or_init(|| Selector::parse("span.error").unwrap())
    }

    fn header_selector(&self) -> &Selector {
        self.header_selector
            .get_or_init(|| Selector::parse("#header").unwrap())
    }

    fn profile_link_regex(&self) -> &Regex {
        self.profile_link_regex
            .get_or_init(|| Regex::new(r#"href="/profile/([^"]+)""#).unwrap())
    }

    fn profile_location_regex(&self) -> &Regex {
        self.profile_location_regex
            .get_or_init(|| Regex::new(r"/profile/([^/?#]+)").unwrap())
    }

    /// Extract the CSRF token from the first `csrf_token` form input
    pub fn extract_csrf_token(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(self.csrf_selector())
            .filter_map(|input| input.value().attr("value"))
            .map(str::trim)
            .find(|token| !token.is_empty())
            .map(str::to_string)
    }

    /// Detect a rejected login, returning the server's message
    pub fn extract_password_error(&self, html: &str) -> Option<String> {
        if !html.contains(PASSWORD_ERROR_MARKER) {
            return None;
        }
        let document = Html::parse_document(html);
        let message = document
            .select(self.password_error_selector())
            .map(|span| span.text().collect::<String>().trim().to_string())
            .find(|text| !text.is_empty());
        Some(message.unwrap_or_else(|| "Invalid handle/email or password".to_string()))
    }

    /// Detect a refused submission in the submit response body
    pub fn extract_submit_error(&self, html: &str) -> Option<SubmitError> {
        if html.contains(DUPLICATE_SUBMISSION_MARKER) {
            return Some(SubmitError::Duplicate);
        }
        let document = Html::parse_document(html);
        document
            .select(self.form_error_selector())
            .filter(|span| span.value().classes().any(|c| c.starts_with("for__")))
            .map(|span| span.text().collect::<String>().trim().to_string())
            .find(|text| !text.is_empty())
            .map(SubmitError::Rejected)
    }

    /// Extract the logged-in handle from the page header
    pub fn extract_header_handle(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let header = document.select(self.header_selector()).next()?.html();
        let captures = self.profile_link_regex().captures(&header)?;
        Some(captures.get(1)?.as_str().to_string())
    }

    /// Extract the handle from a `/profile/{handle}` redirect target
    pub fn extract_location_handle(&self, location: &str) -> Option<String> {
        let captures = self.profile_location_regex().captures(location)?;
        Some(captures.get(1)?.as_str().to_string())
    }
}
