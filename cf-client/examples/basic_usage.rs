//! Basic usage example for the Codeforces client
//!
//! Logs in, scrapes the statements of one contest and watches the verdicts of
//! the account's latest submissions for a minute.
//!
//! Requires `CF_HANDLE` and `CF_PASSWORD` in the environment.

use cf_client::{
    Authenticator, CfClient, Contest, Session, StatementParser, SubmissionTracker, TrackerConfig,
    TrackerEvent, UserStatusFeed,
};
use std::sync::mpsc;
use std::time::{Duration, Instant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let handle = std::env::var("CF_HANDLE")?;
    let password = std::env::var("CF_PASSWORD")?;

    let client = CfClient::builder()
        .client_builder(
            reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .use_rustls_tls(),
        )
        .build()?;

    println!("=== Login ===");
    let mut session = Session::anonymous();
    session.replace(Authenticator::new(&client).login(&handle, &password)?);
    match Authenticator::new(&client).logged_as(&session)? {
        Some(name) => println!("Logged in as {}", name),
        None => println!("Cookie was not recognized"),
    }

    println!("\n=== Statements ===");
    let contest = Contest::new(1850, "Codeforces Round 886 (Div. 4)");
    for task in StatementParser::new().fetch(&client, &contest, &session)? {
        println!(
            "{} | {} ms | {} MB | {} samples",
            task.name,
            task.time_limit.unwrap_or_default(),
            task.memory_limit.unwrap_or_default(),
            task.tests.len()
        );
    }

    println!("\n=== Verdicts ===");
    let host = client.host();
    let feed = UserStatusFeed::new(client, session);
    let mut tracker = SubmissionTracker::new(feed, handle, TrackerConfig::default());

    let (tx, rx) = mpsc::channel();
    tracker.start(tx)?;

    let deadline = Instant::now() + Duration::from_secs(60);
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(left) {
            Ok(TrackerEvent::Verdict(event)) => {
                let url = event.submission_url(&host).unwrap_or_default();
                println!("{} {}", event, url);
            }
            Ok(TrackerEvent::PollFailed(error)) => eprintln!("Poll failed: {}", error),
            Err(_) => break,
        }
    }

    tracker.stop()?;
    Ok(())
}
