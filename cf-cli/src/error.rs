//! Error types for the CLI

use std::path::PathBuf;
use thiserror::Error;

/// Main CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session store error
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// Workspace error
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Codeforces client error
    #[error("{0}")]
    Client(#[from] cf_client::CfError),

    /// Statement parsing error
    #[error("{0}")]
    Parse(#[from] cf_client::ParseError),

    /// Monitor lifecycle error
    #[error("{0}")]
    State(#[from] cf_client::StateError),

    /// Interactive prompt failed
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::config::Config`]
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Selected language has no entry in `languages`
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// No platform config or cache directory
    #[error("Could not determine the {0} directory")]
    NoDirectory(&'static str),

    /// Polling interval of zero
    #[error("Monitor interval must be greater than zero")]
    ZeroInterval,

    /// No handle given and none stored
    #[error("No handle given and no stored login")]
    MissingHandle,

    /// Source file has no problem URL to submit against
    #[error("No problem URL found in {0}")]
    ProblemUrlNotFound(PathBuf),
}

/// Session store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored session is not valid JSON
    #[error("Corrupt session file: {0}")]
    Json(#[from] serde_json::Error),

    /// Store directory creation failed
    #[error("Store directory creation failed: {0}")]
    DirCreation(String),
}

/// Problem workspace errors
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// Writing a file or directory failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a template failed
    #[error("Failed to read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
