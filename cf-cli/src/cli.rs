//! CLI argument parsing using clap

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Codeforces contest helper
#[derive(Parser, Debug)]
#[command(name = "cf", about = "Parse, submit and watch Codeforces problems", version)]
pub struct Args {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only output essentials
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        /// Handle or email (prompted if omitted)
        handle: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show which handle the stored session belongs to
    Whoami,

    /// List contests
    Contests {
        /// List gym contests instead
        #[arg(long)]
        gym: bool,

        /// Only contests that have not started yet
        #[arg(long)]
        upcoming: bool,

        /// Maximum number of contests shown
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Scrape the statements of a contest into the workspace
    Parse {
        /// Contest id
        contest: u64,

        /// Language whose template is used
        #[arg(short, long)]
        language: Option<String>,

        /// Look the contest name up among gym contests
        #[arg(long)]
        gym: bool,
    },

    /// Submit a solution
    Submit {
        /// Source file
        file: PathBuf,

        /// Contest id (read from the problem URL in the file if omitted)
        #[arg(short, long, requires = "problem")]
        contest: Option<String>,

        /// Problem index (read from the problem URL in the file if omitted)
        #[arg(short, long, requires = "contest")]
        problem: Option<String>,

        /// Language key from the config
        #[arg(short, long)]
        language: Option<String>,

        /// Do not watch the verdict afterwards
        #[arg(long)]
        no_watch: bool,
    },

    /// Watch verdicts of recent submissions
    Watch {
        /// Handle to watch (defaults to the stored login)
        handle: Option<String>,

        /// Delay between polls, e.g. `5s`
        #[arg(short, long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,

        /// Submissions fetched per poll
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Stop after this long, e.g. `10m`
        #[arg(long = "for", value_parser = humantime::parse_duration)]
        duration: Option<Duration>,
    },

    /// Write default templates for configured languages
    Templates,
}
