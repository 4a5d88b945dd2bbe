//! Solution submission

use crate::client::{CfClient, read_success_body};
use crate::error::{AuthError, CfError};
use crate::page::PageParser;
use crate::session::Session;
use tracing::{debug, info};

/// A solution to send to the judge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest<'a> {
    pub contest_id: &'a str,
    /// Problem index within the contest, e.g. `A` or `B1`
    pub problem_index: &'a str,
    /// Judge language id (`programTypeId`)
    pub language_id: u32,
    pub source: &'a str,
}

/// Sends solutions through the contest submit form
#[derive(Debug)]
pub struct Submitter<'a> {
    client: &'a CfClient,
    parser: PageParser,
}

impl<'a> Submitter<'a> {
    pub fn new(client: &'a CfClient) -> Self {
        Self {
            client,
            parser: PageParser::new(),
        }
    }

    /// Submit a solution
    ///
    /// Fetches the submit page for a CSRF token, then posts the form to
    /// `/contest/{id}/submit?csrf_token=...`. Nothing is retried.
    ///
    /// # Errors
    ///
    /// * `AuthError::NotLoggedIn` - The session has no cookie
    /// * `AuthError::MissingCsrfToken` - The submit page has no CSRF token
    /// * `SubmitError::Duplicate` - The same source was submitted before
    /// * `SubmitError::Rejected` - The form came back with an error message
    pub fn submit(&self, request: &SubmitRequest<'_>, session: &Session) -> Result<(), CfError> {
        let cookie = session.require()?;
        let path = format!("/contest/{}/submit", request.contest_id);

        let html = read_success_body(self.client.get(&path, &[], Some(cookie))?)?;
        let csrf_token = self
            .parser
            .extract_csrf_token(&html)
            .ok_or(AuthError::MissingCsrfToken)?;

        let mut url = self.client.resolve(&path)?;
        url.query_pairs_mut().append_pair("csrf_token", &csrf_token);

        let language_id = request.language_id.to_string();
        let form = [
            ("csrf_token", csrf_token.as_str()),
            ("action", "submitSolutionFormSubmitted"),
            ("submittedProblemIndex", request.problem_index),
            ("programTypeId", language_id.as_str()),
            ("source", request.source),
        ];

        let response = self.client.post_form(url.as_str(), &form, Some(cookie))?;
        let status = response.status();
        debug!(%status, "Submit form answered");

        let body = response.text().map_err(|_| CfError::Encoding)?;
        if let Some(error) = self.parser.extract_submit_error(&body) {
            return Err(error.into());
        }
        if !status.is_success() && !status.is_redirection() {
            return Err(CfError::InvalidStatus { status });
        }

        info!(
            contest = request.contest_id,
            problem = request.problem_index,
            "Solution submitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmitError;
    use mockito::Matcher;

    const SUBMIT_FORM: &str = r#"<html><body><form class="submit-form" method="post">
        <input type="hidden" name="csrf_token" value="beefbeef"/>
        <select name="programTypeId"><option value="54">GNU G++17</option></select>
        </form></body></html>"#;

    fn client_for(server: &mockito::Server) -> CfClient {
        CfClient::builder()
            .base_url(server.url())
            .unwrap()
            .build()
            .unwrap()
    }

    fn request() -> SubmitRequest<'static> {
        SubmitRequest {
            contest_id: "1850",
            problem_index: "A",
            language_id: 54,
            source: "int main() { return 0; }\n",
        }
    }

    #[test]
    fn test_submit_posts_form() {
        let mut server = mockito::Server::new();
        let page_mock = server
            .mock("GET", "/contest/1850/submit")
            .match_header("cookie", "JSESSIONID=abc")
            .with_status(200)
            .with_body(SUBMIT_FORM)
            .expect(1)
            .create();
        let post_mock = server
            .mock("POST", "/contest/1850/submit")
            .match_query(Matcher::UrlEncoded("csrf_token".into(), "beefbeef".into()))
            .match_header("cookie", "JSESSIONID=abc")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("csrf_token".into(), "beefbeef".into()),
                Matcher::UrlEncoded("action".into(), "submitSolutionFormSubmitted".into()),
                Matcher::UrlEncoded("submittedProblemIndex".into(), "A".into()),
                Matcher::UrlEncoded("programTypeId".into(), "54".into()),
                Matcher::UrlEncoded("source".into(), "int main() { return 0; }\n".into()),
            ]))
            .with_status(302)
            .with_header("location", "/contest/1850/my")
            .expect(1)
            .create();

        let client = client_for(&server);
        let session = Session::from_cookie_string("JSESSIONID=abc");
        Submitter::new(&client).submit(&request(), &session).unwrap();

        page_mock.assert();
        post_mock.assert();
    }

    #[test]
    fn test_duplicate_submission_fails_without_retry() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/contest/1850/submit")
            .with_status(200)
            .with_body(SUBMIT_FORM)
            .create();
        let post_mock = server
            .mock("POST", "/contest/1850/submit")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"<span class="error for__source">You have submitted exactly the same code before</span>"#,
            )
            .expect(1)
            .create();

        let client = client_for(&server);
        let session = Session::from_cookie_string("JSESSIONID=abc");
        let result = Submitter::new(&client).submit(&request(), &session);

        assert!(matches!(
            result,
            Err(CfError::Submit(SubmitError::Duplicate))
        ));
        post_mock.assert();
    }

    #[test]
    fn test_submit_requires_session() {
        let mut server = mockito::Server::new();
        let page_mock = server.mock("GET", "/contest/1850/submit").expect(0).create();

        let client = client_for(&server);
        let result = Submitter::new(&client).submit(&request(), &Session::anonymous());

        assert!(matches!(result, Err(CfError::Auth(AuthError::NotLoggedIn))));
        page_mock.assert();
    }

    #[test]
    fn test_submit_page_without_token() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/contest/1850/submit")
            .with_status(200)
            .with_body("<html><body>Please login</body></html>")
            .create();

        let client = client_for(&server);
        let session = Session::from_cookie_string("JSESSIONID=expired");
        let result = Submitter::new(&client).submit(&request(), &session);

        assert!(matches!(
            result,
            Err(CfError::Auth(AuthError::MissingCsrfToken))
        ));
    }
}
