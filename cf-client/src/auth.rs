//! Two-step login protocol

use crate::client::{CfClient, read_success_body};
use crate::error::{AuthError, CfError};
use crate::page::PageParser;
use crate::session::{CookieJar, Session};
use reqwest::header::LOCATION;
use tracing::{debug, info, warn};

const LOGIN_PATH: &str = "/enter";

/// Obtains a session cookie for a handle/password pair
///
/// # Example
///
/// ```no_run
/// use cf_client::{Authenticator, CfClient, Session};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CfClient::new()?;
/// let mut session = Session::anonymous();
///
/// let cookie = Authenticator::new(&client).login("tourist", "hunter2")?;
/// session.replace(cookie);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Authenticator<'a> {
    client: &'a CfClient,
    parser: PageParser,
}

impl<'a> Authenticator<'a> {
    pub fn new(client: &'a CfClient) -> Self {
        Self {
            client,
            parser: PageParser::new(),
        }
    }

    /// Log in and return the session cookie
    ///
    /// 1. GET the login page without a cookie and read its CSRF token.
    /// 2. Keep the `name=value` pairs of its `set-cookie` headers.
    /// 3. POST the credentials with that partial cookie, redirects disabled.
    /// 4. Merge the cookies issued by the POST into the partial cookie.
    ///
    /// Nothing is committed anywhere; the caller decides what to do with the
    /// returned cookie.
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingCsrfToken` - The login page has no CSRF token
    /// * `AuthError::InvalidCredentials` - The judge rejected the password
    /// * `AuthError::InvalidCookieHeader` - A `set-cookie` header is not text
    /// * `CfError::Request` / `CfError::InvalidStatus` - Transport failures
    pub fn login(&self, handle: &str, password: &str) -> Result<CookieJar, CfError> {
        let response = self.client.get(LOGIN_PATH, &[], None)?;
        let mut cookie = CookieJar::from_headers(response.headers())?;
        let html = read_success_body(response)?;

        let csrf_token = self
            .parser
            .extract_csrf_token(&html)
            .ok_or(AuthError::MissingCsrfToken)?;
        debug!(cookies = cookie.len(), "Fetched login form");

        let form = [
            ("csrf_token", csrf_token.as_str()),
            ("handleOrEmail", handle),
            ("password", password),
            ("remember", "on"),
            ("action", "enter"),
        ];
        let partial = (!cookie.is_empty()).then_some(&cookie);
        let response = self.client.post_form(LOGIN_PATH, &form, partial)?;

        let status = response.status();
        let issued = CookieJar::from_headers(response.headers())?;
        let body = response.text().map_err(|_| CfError::Encoding)?;

        if let Some(message) = self.parser.extract_password_error(&body) {
            return Err(AuthError::InvalidCredentials(message).into());
        }
        if !status.is_redirection() {
            warn!(%status, "Login response was not a redirect");
        }

        cookie.merge(issued);
        info!(handle, "Logged in");
        Ok(cookie)
    }

    /// Find out which handle a session belongs to
    ///
    /// Returns `None` for a logged-out session or when the judge does not
    /// recognize the cookie.
    pub fn logged_as(&self, session: &Session) -> Result<Option<String>, CfError> {
        let Some(cookie) = session.cookie() else {
            return Ok(None);
        };

        let response = self.client.get("/profile", &[], Some(cookie))?;
        let status = response.status();

        if status.is_redirection() {
            let handle = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|location| self.parser.extract_location_handle(location));
            return Ok(handle);
        }
        if !status.is_success() {
            return Ok(None);
        }

        let html = response.text().map_err(|_| CfError::Encoding)?;
        Ok(self.parser.extract_header_handle(&html))
    }
}
