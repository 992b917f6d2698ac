use std::path::Path;

use git2::{DescribeFormatOptions, DescribeOptions, Oid, Repository, Sort};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::remote::Remote;

lazy_static! {
    static ref CHERRY_PICK: Regex =
        Regex::new(r"cherry picked from commit ([0-9a-fA-F]{7,40})").unwrap();
}

/// A tag and the commit time of its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub time: i64,
}

/// Read-only view of the local clone
pub trait SourceRepository {
    fn remotes(&self) -> Result<Vec<Remote>>;

    /// Tags pointing at commits, newest first
    fn tags(&self) -> Result<Vec<TagInfo>>;

    /// Shas reachable from `new` but not from `old`, oldest first
    fn commits_between(&self, old: &str, new: &str) -> Result<Vec<String>>;
}

/// [`SourceRepository`] backed by libgit2
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|_| {
            Error::config(format!("{} is not inside a git repository", path.display()))
        })?;
        Ok(Self { repo })
    }

    fn resolve(&self, reference: &str) -> Result<Oid> {
        self.repo
            .revparse_single(reference)
            .and_then(|object| object.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|_| Error::config(format!("ref {} does not exist", reference)))
    }

    /// `git describe --tags <reference>`
    ///
    /// A tag name describes as itself, even when other tags share its commit.
    pub fn describe(&self, reference: &str) -> Result<String> {
        let oid = self.resolve(reference)?;
        let tag = reference.strip_prefix("refs/tags/").unwrap_or(reference);
        if self.repo.find_reference(&format!("refs/tags/{}", tag)).is_ok() {
            return Ok(tag.to_string());
        }

        let object = self.repo.find_object(oid, None)?;
        let mut options = DescribeOptions::new();
        options.describe_tags();
        let description = object.describe(&options)?;

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(7);
        Ok(description.format(Some(&format))?)
    }

    /// `user.name` and `user.email` from the git config, when set
    pub fn identity(&self) -> (Option<String>, Option<String>) {
        match self.repo.config() {
            Ok(config) => (
                config.get_string("user.name").ok(),
                config.get_string("user.email").ok(),
            ),
            Err(_) => (None, None),
        }
    }
}

impl SourceRepository for GitRepository {
    fn remotes(&self) -> Result<Vec<Remote>> {
        let names = self.repo.remotes()?;
        let mut remotes = Vec::new();

        for name in names.iter().flatten() {
            let remote = self.repo.find_remote(name)?;
            if let Some(url) = remote.url() {
                remotes.push(Remote::new(name, url));
            }
        }

        Ok(remotes)
    }

    fn tags(&self) -> Result<Vec<TagInfo>> {
        let names = self.repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let Ok(commit) = self
                .repo
                .revparse_single(name)
                .and_then(|object| object.peel_to_commit())
            else {
                log::debug!("Skipping tag {} that does not point at a commit", name);
                continue;
            };

            tags.push(TagInfo {
                name: name.to_string(),
                time: commit.time().seconds(),
            });
        }

        tags.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| b.name.cmp(&a.name)));
        Ok(tags)
    }

    fn commits_between(&self, old: &str, new: &str) -> Result<Vec<String>> {
        let old_oid = self.resolve(old)?;
        let new_oid = self.resolve(new)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(new_oid)?;
        revwalk.hide(old_oid)?;

        let mut shas: Vec<String> = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            push_unique(&mut shas, commit.id().to_string());

            for picked in cherry_picked_from(commit.message().unwrap_or("")) {
                push_unique(&mut shas, picked);
            }
        }

        Ok(shas)
    }
}

/// Shas named in "(cherry picked from commit ...)" trailers
pub fn cherry_picked_from(message: &str) -> Vec<String> {
    CHERRY_PICK
        .captures_iter(message)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn push_unique(shas: &mut Vec<String>, sha: String) {
    if !shas.contains(&sha) {
        shas.push(sha);
    }
}
