//! Codeforces Client Library
//!
//! This library automates the parts of the Codeforces judge a contestant
//! touches from the command line: logging in, scraping problem statements,
//! submitting solutions and watching verdicts come in.
//!
//! # Features
//!
//! - Two-step login with CSRF token and cookie merging
//! - Problem statement scraping into [`Task`] records with sample tests
//! - Solution submission with duplicate detection
//! - Verdict tracking on a fixed polling interval
//! - JSON API access (`contest.list`, `user.status`)
//! - Secure TLS using rustls (no OpenSSL dependencies)
//! - Blocking synchronous API
//! - Well-typed errors using thiserror
//!
//! # Example
//!
//! ```no_run
//! use cf_client::{Authenticator, CfClient, Contest, Session, StatementParser};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CfClient::new()?;
//!
//! // Log in and keep the cookie in a session
//! let mut session = Session::anonymous();
//! session.replace(Authenticator::new(&client).login("tourist", "hunter2")?);
//!
//! // Scrape every problem of a contest
//! let contest = Contest::new(1850, "Codeforces Round 886 (Div. 4)");
//! let tasks = StatementParser::new().fetch(&client, &contest, &session)?;
//! for task in &tasks {
//!     println!("{} ({} samples)", task.name, task.tests.len());
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod auth;
mod client;
mod error;
mod model;
mod page;
mod session;
mod statement;
mod submit;
mod tracker;

pub use auth::Authenticator;
pub use client::{CfClient, CfClientBuilder, DEFAULT_BASE_URL};
pub use error::{AuthError, CfError, ParseError, StateError, SubmitError};
pub use model::{
    Contest, ContestPhase, ContestType, IoDescriptor, ProblemRef, Submission, Task, Test, Verdict,
};
pub use session::{CookieJar, MemorySessionStore, Session, SessionStore};
pub use statement::{DocumentQuery, HtmlDocument, StatementParser, collapse_newlines};
pub use submit::{SubmitRequest, Submitter};
pub use tracker::{
    SubmissionSource, SubmissionTracker, TrackerConfig, TrackerEvent, TrackerState, UserStatusFeed,
    VerdictEvent,
};
