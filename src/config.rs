//! Configuration management for find-bzs
//!
//! Settings live in `~/.config/find-bzs/config.yaml`. Every key is optional:
//!
//! ```yaml
//! github:
//!   host: github.com
//!   token_file: ~/.githubtoken
//! tracker:
//!   url: https://bugzilla.redhat.com/
//!   marker: "rhbz#"
//!   status: MODIFIED
//!   link_style: query          # or per-ticket
//! changelog:
//!   author: Ken Dreyer
//!   email: kdreyer@example.com
//!   width: 70
//! package:
//!   name: ceph-ansible
//! targets:
//!   - name: RHEL
//!     format: rpm
//!     tool: rdopkg
//!     build_suffix: .el7cp
//!   - name: Ubuntu
//!     format: deb
//!     tool: rhcephpkg
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tickets::DEFAULT_MARKER;

/// The name of the package, used for config directory naming
const PKG_NAME: &str = "find-bzs";

/// Application configuration loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub github: GitHubConfig,
    pub tracker: TrackerConfig,
    pub changelog: ChangelogConfig,
    pub package: PackageConfig,
    pub targets: Targets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// Host the remotes must point at
    pub host: String,
    /// File holding the API token; `~` is expanded
    pub token_file: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
            token_file: "~/.githubtoken".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Base URL of the Bugzilla instance
    pub url: String,
    /// Text preceding a ticket number in PR descriptions
    pub marker: String,
    /// Status set by the bulk update command
    pub status: String,
    pub link_style: LinkStyle,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url: "https://bugzilla.redhat.com/".to_string(),
            marker: DEFAULT_MARKER.to_string(),
            status: "MODIFIED".to_string(),
            link_style: LinkStyle::default(),
        }
    }
}

/// How the report links to the tickets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStyle {
    /// One search URL listing every ticket
    #[default]
    Query,
    /// One URL per ticket
    PerTicket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogConfig {
    /// Falls back to git's `user.name`
    pub author: Option<String>,
    /// Falls back to git's `user.email`
    pub email: Option<String>,
    /// Column at which the description line wraps
    pub width: usize,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            author: None,
            email: None,
            width: 70,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    /// Falls back to the repository name of the resolved project
    pub name: Option<String>,
}

/// Package format of a downstream target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFormat {
    Rpm,
    Deb,
}

/// Dist-git helper used to import a new version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackagingTool {
    Rdopkg,
    Rhcephpkg,
}

/// A downstream dist-git the new version is packaged for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    pub name: String,
    pub format: PackageFormat,
    pub tool: PackagingTool,
    /// Appended to the package version in the "fixed in" stamp, e.g. `.el7cp`
    #[serde(default)]
    pub build_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Targets(pub Vec<Target>);

impl Default for Targets {
    fn default() -> Self {
        Self(vec![
            Target {
                name: "RHEL".to_string(),
                format: PackageFormat::Rpm,
                tool: PackagingTool::Rdopkg,
                build_suffix: ".el7cp".to_string(),
            },
            Target {
                name: "Ubuntu".to_string(),
                format: PackageFormat::Deb,
                tool: PackagingTool::Rhcephpkg,
                build_suffix: String::new(),
            },
        ])
    }
}

impl Config {
    /// Load the configuration from `path`, using defaults if it does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Token file path with `~` expanded
    pub fn token_path(&self) -> PathBuf {
        expand_home(&self.github.token_file)
    }
}

/// Get the default configuration file path
///
/// Returns `~/.config/find-bzs/config.yaml`
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

fn config_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config").join(PKG_NAME)
}

/// Expand a leading `~` to `$HOME`
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(rest),
            Err(_) => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

/// Read the GitHub token from `path`
///
/// Blank lines and `#` comments are skipped; exactly one line may remain.
/// A missing file is not an error, searches then run unauthenticated.
pub fn read_token<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::warn!(
                "No GitHub token at {}; searches are unauthenticated and may hit the rate limit",
                path.display()
            );
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let mut lines = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let token = lines.next().map(str::to_string);
    if lines.next().is_some() {
        return Err(Error::config(format!("too many lines in {}", path.display())));
    }

    if token.is_none() {
        log::warn!("GitHub token file {} is empty", path.display());
    }
    Ok(token)
}

/// An explicit pair of tags to compare
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRange {
    pub old: String,
    pub new: String,
}

impl TagRange {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Everything the correlation run needs from the outside world
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub token: Option<String>,
    pub repo_path: PathBuf,
    /// `None` picks the two newest tags
    pub range: Option<TagRange>,
}
