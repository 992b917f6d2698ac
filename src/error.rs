use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("GitHub refused the search: {0}")]
    AuthenticationOrRate(String),

    #[error("Found {count} merged pull requests for commit {sha}, expected at most one")]
    MultiplePullRequests { sha: String, count: u64 },

    #[error("GitHub API responded with {status}: {body}")]
    GitHubApi { status: u16, body: String },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl Error {
    /// Shorthand for building a [`Error::Configuration`]
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
