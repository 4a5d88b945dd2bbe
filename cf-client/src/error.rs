//! Error types for the Codeforces client

use thiserror::Error;

/// Errors that can occur when using the Codeforces client
#[derive(Error, Debug)]
pub enum CfError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid HTTP status code received
    #[error("Invalid HTTP status: {status}")]
    InvalidStatus {
        /// The status code that was received
        status: reqwest::StatusCode,
    },

    /// Failed to decode response as UTF-8
    #[error("Failed to decode response as UTF-8")]
    Encoding,

    /// Failed to decode a JSON API response
    #[error("Failed to decode API response: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON API answered with a non-OK status
    #[error("API call failed: {comment}")]
    Api {
        /// Comment returned by the API, if any
        comment: String,
    },

    /// A path or URL could not be resolved against the base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),

    /// Authentication failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Page could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Solution submission was refused
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Tracker lifecycle misuse
    #[error(transparent)]
    State(#[from] StateError),
}

/// Errors raised while obtaining or using a session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The page did not carry a `csrf_token` form input
    #[error("Cannot get csrf_token from page")]
    MissingCsrfToken,

    /// The judge rejected the handle/password pair
    #[error("Login failed: {0}")]
    InvalidCredentials(String),

    /// A `set-cookie` header was not valid text
    #[error("Cannot extract cookie from response headers")]
    InvalidCookieHeader,

    /// The action needs a session but none is stored
    #[error("You must login to do this action")]
    NotLoggedIn,
}

/// Errors raised while turning a problems page into tasks
#[derive(Error, Debug)]
pub enum ParseError {
    /// The page could not be fetched
    #[error("Cannot fetch {url}: {source}")]
    Fetch {
        /// URL that was requested
        url: String,
        /// Underlying failure
        #[source]
        source: Box<CfError>,
    },

    /// The page did not have the expected shape
    #[error("Page structure not recognized: {0}")]
    Structure(String),

    /// A CSS selector failed to compile
    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Errors returned by the judge when submitting a solution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Exactly the same source was submitted before
    #[error("You have submitted exactly the same code before")]
    Duplicate,

    /// The submit form was re-rendered with an error message
    #[error("Submission rejected: {0}")]
    Rejected(String),
}

/// Tracker lifecycle errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// `start` was called on a running tracker
    #[error("Monitor is still running")]
    AlreadyRunning,

    /// `stop` was called on a stopped tracker
    #[error("Monitor is not running")]
    NotRunning,

    /// The polling thread panicked
    #[error("Monitor thread panicked")]
    WorkerPanicked,
}
