//! Output formatting for contests, tasks and verdicts

use cf_client::{Contest, ContestPhase, Task, VerdictEvent};
use chrono::{DateTime, Local};
use itertools::Itertools;
use std::path::PathBuf;
use std::time::Duration;

/// Output formatter for command results
pub struct OutputFormatter {
    quiet: bool,
    start_time: std::time::Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            start_time: std::time::Instant::now(),
        }
    }

    /// Print one line per contest, most recent first
    pub fn print_contests(&self, contests: &[Contest], limit: usize) {
        for contest in contests
            .iter()
            .sorted_by_key(|c| std::cmp::Reverse(c.start_time_seconds))
            .take(limit)
        {
            if self.quiet {
                println!("{}", contest.id);
            } else {
                println!("{}", format_contest(contest));
            }
        }
    }

    /// Print the parsed tasks and where they were written
    pub fn print_tasks(&self, tasks: &[Task], dirs: &[PathBuf]) {
        for (task, dir) in tasks.iter().zip(dirs) {
            if self.quiet {
                println!("{}", dir.display());
            } else {
                println!("{} -> {}", format_task(task), dir.display());
            }
        }
        if !self.quiet {
            println!(
                "Parsed {} problem(s) with {} sample(s) in {}",
                tasks.len(),
                tasks.iter().map(|t| t.tests.len()).sum::<usize>(),
                format_elapsed(self.start_time.elapsed())
            );
        }
    }

    /// Print a verdict notification
    pub fn print_event(&self, event: &VerdictEvent, host: &str) {
        match event.submission_url(host) {
            Some(url) if !self.quiet => println!("{} ({})", event, url),
            _ => println!("{}", event),
        }
    }

    /// Print a status line; suppressed in quiet mode
    pub fn status(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{}", message);
        }
    }
}

/// Format a contest for display
fn format_contest(contest: &Contest) -> String {
    let start = contest
        .start_time_seconds
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let length = humantime::format_duration(Duration::from_secs(contest.duration_seconds));

    let mut line = format!(
        "{:>6}  {}  {:>8}  {}",
        contest.id, start, length, contest.name
    );
    if contest.phase == ContestPhase::Before
        && let Some(relative) = contest.relative_time_seconds
    {
        let until = Duration::from_secs(relative.unsigned_abs());
        line.push_str(&format!(" (starts in {})", humantime::format_duration(until)));
    }
    line
}

/// Format a task summary: name, limits, sample count
fn format_task(task: &Task) -> String {
    let limits = [
        task.time_limit.map(|ms| format!("{} ms", ms)),
        task.memory_limit.map(|mb| format!("{} MB", mb)),
    ]
    .into_iter()
    .flatten()
    .join(", ");

    if limits.is_empty() {
        format!("{} [{} samples]", task.name, task.tests.len())
    } else {
        format!("{} [{}; {} samples]", task.name, limits, task.tests.len())
    }
}

/// Format wall-clock time for display
fn format_elapsed(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.2}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
