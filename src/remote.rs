//! Working out which GitHub project a clone belongs to

use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

/// Remotes tried in order of preference
pub const PREFERRED_REMOTES: [&str; 2] = ["origin", "upstream"];

/// A configured git remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

impl Remote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A project on the hosting service, e.g. `github.com` / `ceph` / `ceph-ansible`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl Project {
    /// `owner/name`, as used in search qualifiers and tracker links
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Base URL of the REST API serving this project
    pub fn api_url(&self) -> String {
        if self.host == "github.com" {
            "https://api.github.com/".to_string()
        } else {
            format!("https://{}/api/v3/", self.host)
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.name)
    }
}

/// Parse a remote URL pointing at `host` into a [`Project`]
///
/// Accepts scp-like ssh (`git@host:owner/repo.git`), `ssh://`, `https://`
/// and `git://` URLs. Returns `None` for anything else.
pub fn parse_project_url(url: &str, host: &str) -> Option<Project> {
    let host_re = regex::escape(host);
    let pattern = format!(
        r"^(?:git@{host}:|ssh://git@{host}/|(?:https|git)://{host}/)(.+)$",
        host = host_re
    );
    let re = Regex::new(&pattern).ok()?;

    let path = re.captures(url.trim())?.get(1)?.as_str();
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let (owner, name) = path.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }

    Some(Project {
        host: host.to_string(),
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

/// Pick the project from "origin", falling back to "upstream"
///
/// A missing remote counts the same as one that does not point at `host`.
pub fn resolve_project(remotes: &[Remote], host: &str) -> Result<Project> {
    let mut tried = Vec::new();

    for wanted in PREFERRED_REMOTES {
        match remotes.iter().find(|r| r.name == wanted) {
            Some(remote) => {
                if let Some(project) = parse_project_url(&remote.url, host) {
                    log::debug!("Using remote {} ({})", remote.name, remote.url);
                    return Ok(project);
                }
                log::debug!("Remote {} does not look like {}: {}", remote.name, host, remote.url);
                tried.push(format!("{} = {}", remote.name, remote.url));
            }
            None => tried.push(format!("{} is not configured", wanted)),
        }
    }

    Err(Error::config(format!(
        "no remote points at {} ({})",
        host,
        tried.join(", ")
    )))
}
