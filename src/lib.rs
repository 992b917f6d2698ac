//! # find-bzs
//!
//! Finds the tracker tickets fixed between two Git tags: every commit in the
//! range is mapped to the pull request that merged it, ticket references are
//! pulled from the PR descriptions, and a report for the maintainer doing the
//! downstream rebase is rendered.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod pipeline;
pub mod pr;
pub mod remote;
pub mod template;
pub mod tickets;
pub mod version;

// Re-export commonly used types
pub use config::{Config, RunOptions, TagRange};
pub use error::{Error, Result};
pub use pipeline::{Correlation, Correlator};
pub use pr::PullRequest;
pub use tickets::{TicketId, TicketSet};
