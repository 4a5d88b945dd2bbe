//! Codeforces HTTP client implementation

use crate::error::CfError;
use crate::session::{CookieJar, Session};
use reqwest::blocking::Response;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderValue};
use serde::Serialize;
use tracing::debug;

/// The default judge host
pub const DEFAULT_BASE_URL: &str = "https://codeforces.com";

/// The main Codeforces HTTP client
///
/// Issues GET/POST requests to the judge host, attaching a session cookie when
/// one is supplied. Relative paths are resolved against the base URL; absolute
/// URLs are used as given.
///
/// # Example
///
/// ```no_run
/// use cf_client::{CfClient, Session};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CfClient::new()?;
/// let html = client.get_html("/contest/1850/problems", &Session::anonymous())?;
/// println!("{} bytes", html.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CfClient {
    client: reqwest::blocking::Client,
    base_url: reqwest::Url,
}

impl CfClient {
    /// Create a new client with rustls-tls configuration and no redirect policy
    ///
    /// # Errors
    ///
    /// Returns `CfError::ClientInit` if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, CfError> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cf_client::CfClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = CfClient::builder()
    ///     .base_url("http://localhost:1234")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> CfClientBuilder {
        CfClientBuilder::new()
    }

    /// The judge host every relative path is resolved against
    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    /// Host part of the base URL without a trailing slash, e.g. `https://codeforces.com`
    pub fn host(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }

    /// Resolve a relative path or absolute URL
    pub fn resolve(&self, target: &str) -> Result<reqwest::Url, CfError> {
        let resolved = if target.starts_with("http://") || target.starts_with("https://") {
            reqwest::Url::parse(target)
        } else {
            self.base_url.join(target)
        };
        resolved.map_err(|e| CfError::InvalidUrl(format!("{}: {}", target, e)))
    }

    /// Send a GET request, attaching `cookie` when present
    ///
    /// The response is returned whatever its status; redirects are not followed.
    pub(crate) fn get(
        &self,
        target: &str,
        query: &[(&str, String)],
        cookie: Option<&CookieJar>,
    ) -> Result<Response, CfError> {
        let url = self.resolve(target)?;
        debug!(method = "GET", %url, authenticated = cookie.is_some(), "Sending request");

        let mut request = self.client.get(url).query(query);
        if let Some(jar) = cookie {
            request = request.header(COOKIE, jar.header_value()?);
        }
        Ok(request.send()?)
    }

    /// Send a form-encoded POST request, attaching `cookie` when present
    pub(crate) fn post_form<F: Serialize + ?Sized>(
        &self,
        target: &str,
        form: &F,
        cookie: Option<&CookieJar>,
    ) -> Result<Response, CfError> {
        let url = self.resolve(target)?;
        debug!(method = "POST", %url, authenticated = cookie.is_some(), "Sending request");

        let mut request = self.client.post(url).header(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        if let Some(jar) = cookie {
            request = request.header(COOKIE, jar.header_value()?);
        }
        Ok(request.form(form).send()?)
    }

    /// Fetch a page as text
    ///
    /// The session cookie is attached when the session is logged in.
    ///
    /// # Errors
    ///
    /// * `CfError::Request` - Network error
    /// * `CfError::InvalidStatus` - Non-success status, including redirects
    /// * `CfError::Encoding` - Response is not valid UTF-8
    pub fn get_html(&self, target: &str, session: &Session) -> Result<String, CfError> {
        let response = self.get(target, &[], session.cookie())?;
        read_success_body(response)
    }
}

/// Read the body of a successful response
pub(crate) fn read_success_body(response: Response) -> Result<String, CfError> {
    if !response.status().is_success() {
        return Err(CfError::InvalidStatus {
            status: response.status(),
        });
    }
    response.text().map_err(|_| CfError::Encoding)
}

/// Builder for configuring a Codeforces HTTP client
///
/// The redirect policy is always set to `none`: login success is signalled by a
/// redirect that must be observed rather than followed.
///
/// # Example
///
/// ```no_run
/// use cf_client::CfClient;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CfClient::builder()
///     .base_url("http://localhost:1234")?
///     .client_builder(
///         reqwest::blocking::Client::builder()
///             .timeout(Duration::from_secs(10))
///     )
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CfClientBuilder {
    base_url: Option<reqwest::Url>,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl CfClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            base_url: None,
            client_builder: None,
        }
    }

    /// Set a custom base URL for the client
    ///
    /// The URL is parsed and validated at builder time.
    pub fn base_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, CfError> {
        self.base_url = Some(url.into_url()?);
        Ok(self)
    }

    /// Set a custom HTTP client builder
    ///
    /// The redirect policy will always be overridden to `Policy::none()`.
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the client with the configured settings
    pub fn build(self) -> Result<CfClient, CfError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => reqwest::Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| CfError::ClientInit(e.to_string()))?,
        };

        let builder = self
            .client_builder
            .unwrap_or_else(|| reqwest::blocking::Client::builder().use_rustls_tls());

        let client = builder
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| CfError::ClientInit(e.to_string()))?;

        Ok(CfClient { client, base_url })
    }
}

impl Default for CfClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        #[test]
        fn prop_base_url_configuration(
            scheme in prop::sample::select(vec!["http", "https"]),
            host in "[a-z]{3,10}",
            port in 1000u16..10000u16,
        ) {
            let base_url = format!("{}://{}:{}", scheme, host, port);

            let client = CfClient::builder()
                .base_url(&base_url)
                .unwrap()
                .build()
                .unwrap();

            prop_assert_eq!(client.base_url.scheme(), scheme);
            prop_assert_eq!(client.base_url.host_str(), Some(host.as_str()));
            prop_assert_eq!(client.base_url.port(), Some(port));
            prop_assert_eq!(client.host(), base_url);
        }

        #[test]
        fn prop_relative_paths_resolve_against_base(
            contest_id in 1u64..100000,
            index in "[A-H][1-2]?",
        ) {
            let client = CfClient::builder()
                .base_url("http://judge.test:8080")
                .unwrap()
                .build()
                .unwrap();

            let path = format!("/contest/{}/problem/{}", contest_id, index);
            let url = client.resolve(&path).unwrap();
            prop_assert_eq!(url.as_str(), format!("http://judge.test:8080{}", path));
        }
    }

    #[test]
    fn test_default_base_url() {
        let client = CfClient::builder().build().unwrap();
        assert_eq!(client.base_url().as_str(), "https://codeforces.com/");
        assert_eq!(client.host(), "https://codeforces.com");
    }

    #[test]
    fn test_custom_client_builder() {
        let custom_builder = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .use_rustls_tls();

        let result = CfClient::builder().client_builder(custom_builder).build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_absolute_url_is_kept() {
        let client = CfClient::new().unwrap();
        let url = client.resolve("http://other.host/enter").unwrap();
        assert_eq!(url.as_str(), "http://other.host/enter");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(CfClient::builder().base_url("not a valid url").is_err());
    }

    #[test]
    fn test_redirect_policy_enforcement() {
        let mut server = mockito::Server::new();

        let target_mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html><body>Home page</body></html>")
            .expect(0)
            .create();

        let redirect_mock = server
            .mock("GET", "/contest/1/problems")
            .with_status(302)
            .with_header("location", "/")
            .expect(1)
            .create();

        let client = CfClient::builder()
            .base_url(server.url())
            .unwrap()
            .build()
            .unwrap();

        let result = client.get_html("/contest/1/problems", &Session::anonymous());
        match result {
            Err(CfError::InvalidStatus { status }) => assert_eq!(status.as_u16(), 302),
            other => panic!("Expected InvalidStatus, got {:?}", other),
        }

        target_mock.assert();
        redirect_mock.assert();
    }

    #[test]
    fn test_session_cookie_is_attached() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/profile")
            .match_header("cookie", "JSESSIONID=abc; 39ce7=xyz")
            .with_status(200)
            .with_body("ok")
            .expect(1)
            .create();

        let client = CfClient::builder()
            .base_url(server.url())
            .unwrap()
            .build()
            .unwrap();
        let session = Session::from_cookie_string("JSESSIONID=abc; 39ce7=xyz");

        assert_eq!(client.get_html("/profile", &session).unwrap(), "ok");
        mock.assert();
    }

    #[test]
    fn test_anonymous_request_has_no_cookie() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/enter")
            .match_header("cookie", mockito::Matcher::Missing)
            .with_status(200)
            .with_body("login")
            .expect(1)
            .create();

        let client = CfClient::builder()
            .base_url(server.url())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            client.get_html("/enter", &Session::anonymous()).unwrap(),
            "login"
        );
        mock.assert();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        #[test]
        fn prop_non_success_status_error_handling(
            status_code in prop::sample::select(vec![400, 401, 403, 404, 429, 500, 502, 503, 504]),
        ) {
            let mut server = mockito::Server::new();
            let mock = server.mock("GET", "/contest/1/problems")
                .with_status(status_code)
                .with_body("Error response")
                .expect(1)
                .create();

            let client = CfClient::builder()
                .base_url(server.url())
                .unwrap()
                .build()
                .unwrap();

            let result = client.get_html("/contest/1/problems", &Session::anonymous());
            match result {
                Err(CfError::InvalidStatus { status }) => {
                    prop_assert_eq!(status.as_u16(), status_code as u16);
                }
                other => {
                    prop_assert!(false, "Expected CfError::InvalidStatus, got {:?}", other);
                }
            }

            mock.assert();
        }
    }
}
