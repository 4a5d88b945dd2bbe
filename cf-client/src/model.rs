//! Data model shared by the API, the statement parser and the tracker

use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope of every `/api/*` response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub status: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContestType {
    Cf,
    Ioi,
    Icpc,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContestPhase {
    Before,
    Coding,
    PendingSystemTest,
    SystemTest,
    Finished,
    #[serde(other)]
    Unknown,
}

/// A contest as returned by `/api/contest.list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ContestType,
    pub phase: ContestPhase,
    #[serde(default)]
    pub frozen: bool,
    pub duration_seconds: u64,
    #[serde(default)]
    pub start_time_seconds: Option<i64>,
    #[serde(default)]
    pub relative_time_seconds: Option<i64>,
}

impl Contest {
    /// A finished CF-style contest with only the fields the parser needs
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ContestType::Cf,
            phase: ContestPhase::Finished,
            frozen: false,
            duration_seconds: 0,
            start_time_seconds: None,
            relative_time_seconds: None,
        }
    }
}

/// Judge classification of a submission
///
/// `Testing` is the only non-terminal value. The API omits the field while a
/// submission waits in the queue, which also decodes as `Testing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Failed,
    Ok,
    Partial,
    CompilationError,
    RuntimeError,
    WrongAnswer,
    PresentationError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    IdlenessLimitExceeded,
    SecurityViolated,
    Crashed,
    InputPreparationCrashed,
    Challenged,
    Skipped,
    #[default]
    Testing,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl Verdict {
    pub fn is_terminal(self) -> bool {
        self != Verdict::Testing
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Failed => "FAILED",
            Verdict::Ok => "OK",
            Verdict::Partial => "PARTIAL",
            Verdict::CompilationError => "COMPILATION_ERROR",
            Verdict::RuntimeError => "RUNTIME_ERROR",
            Verdict::WrongAnswer => "WRONG_ANSWER",
            Verdict::PresentationError => "PRESENTATION_ERROR",
            Verdict::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Verdict::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            Verdict::IdlenessLimitExceeded => "IDLENESS_LIMIT_EXCEEDED",
            Verdict::SecurityViolated => "SECURITY_VIOLATED",
            Verdict::Crashed => "CRASHED",
            Verdict::InputPreparationCrashed => "INPUT_PREPARATION_CRASHED",
            Verdict::Challenged => "CHALLENGED",
            Verdict::Skipped => "SKIPPED",
            Verdict::Testing => "TESTING",
            Verdict::Rejected => "REJECTED",
            Verdict::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problem reference embedded in a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRef {
    #[serde(default)]
    pub contest_id: Option<u64>,
    pub index: String,
    pub name: String,
}

/// A submission as returned by `/api/user.status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: u64,
    #[serde(default)]
    pub contest_id: Option<u64>,
    #[serde(default)]
    pub creation_time_seconds: i64,
    pub problem: ProblemRef,
    #[serde(default)]
    pub programming_language: String,
    #[serde(default)]
    pub verdict: Verdict,
    #[serde(default)]
    pub testset: String,
    #[serde(default)]
    pub passed_test_count: u32,
    #[serde(default)]
    pub time_consumed_millis: u64,
    #[serde(default)]
    pub memory_consumed_bytes: u64,
}

/// Where a task reads input from or writes output to
///
/// `kind` is `"stdin"`/`"stdout"` for standard streams, otherwise the literal
/// descriptor text from the statement (file based I/O).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
}

impl IoDescriptor {
    pub fn stdin() -> Self {
        Self {
            kind: "stdin".to_string(),
        }
    }

    pub fn stdout() -> Self {
        Self {
            kind: "stdout".to_string(),
        }
    }
}

/// One sample test of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    /// 1-based pairing index within the task, as a decimal string
    pub id: String,
    pub input: String,
    pub output: String,
}

/// A parsed problem statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Display name, e.g. `A. Sum`
    pub name: String,
    /// Name of the owning contest
    pub group: String,
    pub url: String,
    pub input: IoDescriptor,
    pub output: IoDescriptor,
    /// Time limit in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u64>,
    /// Memory limit in megabytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<u64>,
    pub tests: Vec<Test>,
}

impl Task {
    /// Short problem index, the part of the name before the first `.`
    pub fn index(&self) -> &str {
        problem_index(&self.name)
    }
}

pub(crate) fn problem_index(name: &str) -> &str {
    name.split_once('.').map_or(name, |(index, _)| index).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_without_verdict_is_testing() {
        let json = r#"{
            "id": 5,
            "contestId": 1850,
            "creationTimeSeconds": 1700000000,
            "problem": {"contestId": 1850, "index": "A", "name": "To My Critics"},
            "programmingLanguage": "GNU C++17",
            "testset": "TESTS",
            "passedTestCount": 0,
            "timeConsumedMillis": 0,
            "memoryConsumedBytes": 0
        }"#;
        let sub: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(sub.verdict, Verdict::Testing);
        assert!(!sub.verdict.is_terminal());
    }

    #[test]
    fn test_unknown_verdict_is_terminal() {
        let verdict: Verdict = serde_json::from_str(r#""SOMETHING_NEW""#).unwrap();
        assert_eq!(verdict, Verdict::Unknown);
        assert!(verdict.is_terminal());
    }

    #[test]
    fn test_verdict_display_matches_wire_name() {
        for name in ["OK", "WRONG_ANSWER", "TIME_LIMIT_EXCEEDED", "TESTING"] {
            let verdict: Verdict = serde_json::from_str(&format!("\"{}\"", name)).unwrap();
            assert_eq!(verdict.to_string(), name);
        }
    }

    #[test]
    fn test_contest_decoding() {
        let json = r#"{
            "id": 1850, "name": "Codeforces Round 886 (Div. 4)", "type": "ICPC",
            "phase": "FINISHED", "frozen": false, "durationSeconds": 8100,
            "startTimeSeconds": 1689950100, "relativeTimeSeconds": 99999
        }"#;
        let contest: Contest = serde_json::from_str(json).unwrap();
        assert_eq!(contest.kind, ContestType::Icpc);
        assert_eq!(contest.phase, ContestPhase::Finished);
        assert_eq!(contest.duration_seconds, 8100);
    }

    #[test]
    fn test_unrecognized_contest_type_and_phase() {
        let json = r#"[
            {"id": 1, "name": "Old", "type": "CF", "phase": "FINISHED", "durationSeconds": 7200},
            {"id": 2, "name": "New", "type": "MARATHON", "phase": "PENDING_REVIEW", "durationSeconds": 7200}
        ]"#;
        let contests: Vec<Contest> = serde_json::from_str(json).unwrap();
        assert_eq!(contests.len(), 2);
        assert_eq!(contests[1].kind, ContestType::Unknown);
        assert_eq!(contests[1].phase, ContestPhase::Unknown);
    }

    #[test]
    fn test_envelope_without_result() {
        let envelope: ApiResponse<Vec<Contest>> =
            serde_json::from_str(r#"{"status": "FAILED", "comment": "handle: not found"}"#).unwrap();
        assert_eq!(envelope.status, "FAILED");
        assert!(envelope.result.is_none());
        assert_eq!(envelope.comment.as_deref(), Some("handle: not found"));
    }

    #[test]
    fn test_problem_index() {
        assert_eq!(problem_index("A. Sum"), "A");
        assert_eq!(problem_index("B1. Easy version. Really"), "B1");
        assert_eq!(problem_index("NoDot"), "NoDot");
        assert_eq!(problem_index(" C . Spaced"), "C");
    }
}
