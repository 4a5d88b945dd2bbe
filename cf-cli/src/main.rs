//! CF CLI - Command-line helper for Codeforces contests

mod cli;
mod config;
mod error;
mod output;
mod store;
mod workspace;

use cf_client::{
    Authenticator, CfClient, Contest, ContestPhase, Session, SessionStore, StatementParser,
    SubmissionTracker, SubmitRequest, Submitter, TrackerConfig, TrackerEvent, UserStatusFeed,
};
use clap::Parser;
use cli::{Args, Command};
use config::Config;
use error::{CliError, ConfigError};
use output::OutputFormatter;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};
use store::FileSessionStore;
use tracing::{Level, warn};
use workspace::Workspace;
use zeroize::Zeroizing;

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let config = Config::load(args.config.as_deref())?;
    let formatter = OutputFormatter::new(args.quiet);
    let client = CfClient::builder().base_url(config.host.as_str())?.build()?;
    let store = FileSessionStore::new(config.cache_dir()?);

    match args.command {
        Command::Login { handle } => login(&client, &store, handle, &formatter),
        Command::Logout => {
            store.clear()?;
            formatter.status("Logged out");
            Ok(())
        }
        Command::Whoami => {
            let session = store.load()?;
            match Authenticator::new(&client).logged_as(&session)? {
                Some(handle) => println!("{}", handle),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Contests {
            gym,
            upcoming,
            limit,
        } => {
            let mut contests = client.contest_list(gym)?;
            if upcoming {
                contests.retain(|c| c.phase == ContestPhase::Before);
            }
            formatter.print_contests(&contests, limit);
            Ok(())
        }
        Command::Parse {
            contest,
            language,
            gym,
        } => parse(&client, &store, &config, contest, language.as_deref(), gym, &formatter),
        Command::Submit {
            file,
            contest,
            problem,
            language,
            no_watch,
        } => {
            let source = std::fs::read_to_string(&file)?;
            let (contest_id, problem_index) = match (contest, problem) {
                (Some(contest), Some(problem)) => (contest, problem),
                _ => workspace::extract_problem_info(&source)
                    .ok_or_else(|| ConfigError::ProblemUrlNotFound(file.clone()))?,
            };
            let request = SubmitRequest {
                contest_id: &contest_id,
                problem_index: &problem_index,
                language_id: config.language(language.as_deref())?.id,
                source: &source,
            };
            let watch = config.monitor.auto_start && !no_watch;
            submit(&client, &store, &config, &request, watch, &formatter)
        }
        Command::Watch {
            handle,
            interval,
            count,
            duration,
        } => {
            let handle = match handle {
                Some(handle) => handle,
                None => store.handle()?.ok_or(ConfigError::MissingHandle)?,
            };
            let tracker_config = TrackerConfig {
                interval: interval.unwrap_or(config.monitor.interval),
                count: count.unwrap_or(config.monitor.count),
            };
            if tracker_config.interval.is_zero() {
                return Err(ConfigError::ZeroInterval.into());
            }

            let feed = UserStatusFeed::new(client.clone(), store.load()?);
            let mut tracker = SubmissionTracker::new(feed, handle, tracker_config);
            let (tx, rx) = mpsc::channel();
            tracker.start(tx)?;
            formatter.status(format!("Watching {} (interrupt to stop)", tracker.handle()));

            follow(&rx, &client.host(), duration, None, &formatter);
            tracker.stop()?;
            Ok(())
        }
        Command::Templates => {
            let written =
                workspace::write_default_templates(&config.templates_dir, config.languages.values())?;
            if written.is_empty() {
                formatter.status("All templates present");
            }
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

/// Log in interactively and persist the session
fn login(
    client: &CfClient,
    store: &FileSessionStore,
    handle: Option<String>,
    formatter: &OutputFormatter,
) -> Result<(), CliError> {
    let handle = match handle {
        Some(handle) => handle,
        None => prompt_line("Handle or email: ")?,
    };
    let password = Zeroizing::new(
        rpassword::prompt_password("Password: ").map_err(|e| CliError::Prompt(e.to_string()))?,
    );

    let authenticator = Authenticator::new(client);
    let session = Session::with_cookie(authenticator.login(&handle, &password)?);
    store.save(&session)?;

    // Logging in by email still stores the handle
    let name = authenticator.logged_as(&session)?.unwrap_or(handle);
    store.set_handle(&name)?;
    formatter.status(format!("Logged in as {}", name));
    Ok(())
}

/// Scrape a contest and write its workspace
fn parse(
    client: &CfClient,
    store: &FileSessionStore,
    config: &Config,
    contest_id: u64,
    language: Option<&str>,
    gym: bool,
    formatter: &OutputFormatter,
) -> Result<(), CliError> {
    let contest = match client.contest_list(gym) {
        Ok(contests) => contests.into_iter().find(|c| c.id == contest_id),
        Err(error) => {
            warn!(%error, "Could not look up the contest name");
            None
        }
    }
    .unwrap_or_else(|| Contest::new(contest_id, contest_id.to_string()));

    let session = store.load()?;
    let tasks = StatementParser::new().fetch(client, &contest, &session)?;

    let language = config.language(language)?;
    let workspace = Workspace::new(&config.src_dir, &config.templates_dir, language)?;
    let dirs = workspace.materialize(&tasks)?;
    formatter.print_tasks(&tasks, &dirs);
    Ok(())
}

/// Submit a solution, optionally following it until it is judged
///
/// The monitor is started before submitting so that the new submission is
/// announced even when judging finishes before the first poll.
fn submit(
    client: &CfClient,
    store: &FileSessionStore,
    config: &Config,
    request: &SubmitRequest<'_>,
    watch: bool,
    formatter: &OutputFormatter,
) -> Result<(), CliError> {
    let session = store.load()?;

    let mut monitor = None;
    if watch {
        let handle = store.handle()?.ok_or(ConfigError::MissingHandle)?;
        let tracker_config = TrackerConfig {
            interval: config.monitor.interval,
            count: config.monitor.count,
        };
        let feed = UserStatusFeed::new(client.clone(), session.clone());
        let mut tracker = SubmissionTracker::new(feed, handle, tracker_config);
        let (tx, rx) = mpsc::channel();
        tracker.start(tx)?;
        // Anything at or below the mark existed before this submission
        let baseline = tracker.state().last_submission_id().unwrap_or(0);
        monitor = Some((tracker, rx, baseline));
    }

    Submitter::new(client).submit(request, &session)?;
    formatter.status(format!(
        "Submitted {}{}",
        request.contest_id, request.problem_index
    ));

    if let Some((mut tracker, rx, baseline)) = monitor {
        follow(&rx, &client.host(), None, Some(baseline), formatter);
        tracker.stop()?;
    }
    Ok(())
}

/// Print tracker events until the channel closes or the deadline passes
///
/// With `judged_after`, also stop once a submission newer than that id gets a
/// final verdict, and return its id. Older submissions still being judged are
/// printed but do not end the loop.
fn follow(
    rx: &Receiver<TrackerEvent>,
    host: &str,
    duration: Option<Duration>,
    judged_after: Option<u64>,
    formatter: &OutputFormatter,
) -> Option<u64> {
    let deadline = duration.map(|d| Instant::now() + d);
    loop {
        let received = match deadline {
            Some(deadline) => rx
                .recv_timeout(deadline.saturating_duration_since(Instant::now()))
                .ok(),
            None => rx.recv().ok(),
        };
        let event = received?;

        match event {
            TrackerEvent::Verdict(verdict) => {
                formatter.print_event(&verdict, host);
                let submission = verdict.submission();
                if judged_after.is_some_and(|mark| submission.id > mark)
                    && submission.verdict.is_terminal()
                {
                    return Some(submission.id);
                }
            }
            TrackerEvent::PollFailed(error) => warn!(%error, "Poll failed, retrying on next tick"),
        }
    }
}

/// Prompt for a single line on stdin
fn prompt_line(prompt: &str) -> Result<String, CliError> {
    use std::io::Write;
    print!("{}", prompt);
    std::io::stdout().flush().ok();

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::Prompt(e.to_string()))?;

    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::Prompt("Input is required".to_string()));
    }
    Ok(input.to_string())
}
