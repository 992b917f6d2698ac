//! Commit -> pull request -> ticket correlation
//!
//! Commits are walked oldest first, one blocking lookup at a time, so the
//! resulting [`TicketSet`] lists tickets in the order their fixes landed.

use crate::config::TagRange;
use crate::error::{Error, Result};
use crate::git::SourceRepository;
use crate::github::PullRequestResolver;
use crate::pr::PullRequest;
use crate::tickets::{TicketExtractor, TicketSet};

/// Outcome of walking one tag range
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Correlation {
    pub range: Option<TagRange>,
    /// Number of commits looked up
    pub commits: usize,
    /// Distinct merged PRs, in discovery order
    pub pull_requests: Vec<PullRequest>,
    /// Commits no merged PR was found for
    pub unresolved: Vec<String>,
    pub tickets: TicketSet,
}

/// Maps commits to tickets through their merged pull requests
pub struct Correlator<'a> {
    resolver: &'a dyn PullRequestResolver,
    extractor: &'a dyn TicketExtractor,
}

impl<'a> Correlator<'a> {
    pub fn new(resolver: &'a dyn PullRequestResolver, extractor: &'a dyn TicketExtractor) -> Self {
        Self {
            resolver,
            extractor,
        }
    }

    /// Look up every sha in order
    ///
    /// A commit without a PR is logged and skipped. Any resolver error
    /// aborts the whole walk.
    pub fn correlate<I, S>(&self, shas: I) -> Result<Correlation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut correlation = Correlation::default();

        for sha in shas {
            let sha = sha.as_ref();
            correlation.commits += 1;

            let Some(pr) = self.resolver.find_merged_pull_request(sha)? else {
                log::warn!("Could not find a merged pull request for {}", sha);
                correlation.unresolved.push(sha.to_string());
                continue;
            };

            if correlation.pull_requests.iter().any(|seen| seen.number == pr.number) {
                log::debug!("{} belongs to already seen PR #{}", sha, pr.number);
                continue;
            }

            let found = self.extractor.extract(&pr.body);
            log::debug!(
                "{} -> PR #{} \"{}\" ({}) -> {} ticket(s)",
                sha,
                pr.number,
                pr.title,
                pr.url,
                found.len()
            );
            correlation.tickets.extend(found);
            correlation.pull_requests.push(pr);
        }

        Ok(correlation)
    }

    /// Resolve the range, enumerate its commits and correlate them
    pub fn correlate_range(
        &self,
        repo: &dyn SourceRepository,
        range: Option<&TagRange>,
    ) -> Result<Correlation> {
        let range = pick_range(repo, range)?;
        log::debug!("Comparing {}..{}", range.old, range.new);

        let shas = repo.commits_between(&range.old, &range.new)?;
        log::debug!("{} commit(s) in range", shas.len());

        let mut correlation = self.correlate(&shas)?;
        correlation.range = Some(range);
        Ok(correlation)
    }
}

/// Use the explicit range, or the two newest tags
pub fn pick_range(repo: &dyn SourceRepository, explicit: Option<&TagRange>) -> Result<TagRange> {
    let tags = repo.tags()?;

    if let Some(range) = explicit {
        for name in [&range.old, &range.new] {
            if !tags.iter().any(|tag| &tag.name == name) {
                return Err(Error::config(format!("tag {} does not exist", name)));
            }
        }
        return Ok(range.clone());
    }

    match tags.as_slice() {
        [newest, previous, ..] => Ok(TagRange::new(&previous.name, &newest.name)),
        _ => Err(Error::config(format!(
            "need at least two tags to pick a range, found {}",
            tags.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::TagInfo;
    use crate::remote::Remote;
    use crate::tickets::{MarkerExtractor, TicketId};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Resolver answering from a fixed map and recording each lookup
    #[derive(Default)]
    struct ScriptedResolver {
        prs: HashMap<String, PullRequest>,
        failing: Option<String>,
        lookups: RefCell<Vec<String>>,
    }

    impl ScriptedResolver {
        fn with(mut self, sha: &str, number: u64, body: &str) -> Self {
            self.prs
                .insert(sha.to_string(), PullRequest::new(number).with_body(body));
            self
        }

        fn failing_on(mut self, sha: &str) -> Self {
            self.failing = Some(sha.to_string());
            self
        }
    }

    impl PullRequestResolver for ScriptedResolver {
        fn find_merged_pull_request(&self, sha: &str) -> Result<Option<PullRequest>> {
            self.lookups.borrow_mut().push(sha.to_string());
            if self.failing.as_deref() == Some(sha) {
                return Err(Error::AuthenticationOrRate("search rate limit exhausted".into()));
            }
            Ok(self.prs.get(sha).cloned())
        }
    }

    struct FakeRepo {
        tags: Vec<&'static str>,
        commits: Vec<&'static str>,
    }

    impl SourceRepository for FakeRepo {
        fn remotes(&self) -> Result<Vec<Remote>> {
            Ok(vec![])
        }

        fn tags(&self) -> Result<Vec<TagInfo>> {
            Ok(self
                .tags
                .iter()
                .map(|name| TagInfo {
                    name: name.to_string(),
                    time: 0,
                })
                .collect())
        }

        fn commits_between(&self, _old: &str, _new: &str) -> Result<Vec<String>> {
            Ok(self.commits.iter().map(|s| s.to_string()).collect())
        }
    }

    fn ids(values: &[u64]) -> Vec<TicketId> {
        values.iter().copied().map(TicketId).collect()
    }

    #[test]
    fn test_two_prs_share_a_ticket() {
        let resolver = ScriptedResolver::default()
            .with("aaa", 1, "Fixes rhbz#100 and rhbz#101")
            .with("bbb", 2, "rhbz#100");
        let extractor = MarkerExtractor::default();

        let correlation = Correlator::new(&resolver, &extractor)
            .correlate(["aaa", "bbb"])
            .unwrap();

        assert_eq!(correlation.tickets.as_slice(), ids(&[100, 101]).as_slice());
        assert_eq!(correlation.pull_requests.len(), 2);
        assert!(correlation.unresolved.is_empty());
    }

    #[test]
    fn test_order_follows_first_appearance() {
        let resolver = ScriptedResolver::default()
            .with("aaa", 1, "rhbz#300")
            .with("bbb", 2, "rhbz#100 rhbz#300")
            .with("ccc", 3, "rhbz#200 rhbz#100");
        let extractor = MarkerExtractor::default();

        let correlation = Correlator::new(&resolver, &extractor)
            .correlate(["aaa", "bbb", "ccc"])
            .unwrap();

        assert_eq!(correlation.tickets.as_slice(), ids(&[300, 100, 200]).as_slice());
    }

    #[test]
    fn test_unresolved_commit_is_skipped() {
        let resolver = ScriptedResolver::default()
            .with("aaa", 1, "rhbz#1")
            .with("ccc", 3, "rhbz#3");
        let extractor = MarkerExtractor::default();

        let correlation = Correlator::new(&resolver, &extractor)
            .correlate(["aaa", "bbb", "ccc"])
            .unwrap();

        assert_eq!(correlation.unresolved, vec!["bbb".to_string()]);
        assert_eq!(correlation.tickets.as_slice(), ids(&[1, 3]).as_slice());
        assert_eq!(correlation.commits, 3);
        assert_eq!(*resolver.lookups.borrow(), vec!["aaa", "bbb", "ccc"]);
    }

    #[test]
    fn test_pr_without_tickets() {
        let resolver = ScriptedResolver::default().with("aaa", 1, "just a refactor");
        let extractor = MarkerExtractor::default();

        let correlation = Correlator::new(&resolver, &extractor)
            .correlate(["aaa"])
            .unwrap();

        assert!(correlation.tickets.is_empty());
        assert!(correlation.unresolved.is_empty());
        assert_eq!(correlation.pull_requests.len(), 1);
    }

    #[test]
    fn test_same_pr_from_several_commits() {
        let resolver = ScriptedResolver::default()
            .with("aaa", 7, "rhbz#1")
            .with("bbb", 7, "rhbz#1");
        let extractor = MarkerExtractor::default();

        let correlation = Correlator::new(&resolver, &extractor)
            .correlate(["aaa", "bbb"])
            .unwrap();

        assert_eq!(correlation.pull_requests.len(), 1);
        assert_eq!(correlation.tickets.len(), 1);
    }

    #[test]
    fn test_resolver_error_aborts() {
        let resolver = ScriptedResolver::default()
            .with("aaa", 1, "rhbz#1")
            .with("ccc", 3, "rhbz#3")
            .failing_on("bbb");
        let extractor = MarkerExtractor::default();

        let err = Correlator::new(&resolver, &extractor)
            .correlate(["aaa", "bbb", "ccc"])
            .unwrap_err();

        assert!(matches!(err, Error::AuthenticationOrRate(_)));
        assert_eq!(*resolver.lookups.borrow(), vec!["aaa", "bbb"]);
    }

    #[test]
    fn test_empty_range() {
        let resolver = ScriptedResolver::default();
        let extractor = MarkerExtractor::default();
        let repo = FakeRepo {
            tags: vec!["v1.0.1", "v1.0.0"],
            commits: vec![],
        };

        let correlation = Correlator::new(&resolver, &extractor)
            .correlate_range(&repo, None)
            .unwrap();

        assert_eq!(correlation.commits, 0);
        assert!(correlation.tickets.is_empty());
        assert_eq!(correlation.range, Some(TagRange::new("v1.0.0", "v1.0.1")));
    }

    #[test]
    fn test_pick_range_auto_detects_two_newest() {
        let repo = FakeRepo {
            tags: vec!["v2.0.0", "v1.9.0", "v1.8.0"],
            commits: vec![],
        };
        assert_eq!(
            pick_range(&repo, None).unwrap(),
            TagRange::new("v1.9.0", "v2.0.0")
        );
    }

    #[test]
    fn test_pick_range_needs_two_tags() {
        let repo = FakeRepo {
            tags: vec!["v1.0.0"],
            commits: vec![],
        };
        let err = pick_range(&repo, None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_pick_range_rejects_unknown_tag() {
        let repo = FakeRepo {
            tags: vec!["v1.0.0", "v1.0.1"],
            commits: vec![],
        };
        let range = TagRange::new("v0.9.0", "v1.0.1");
        let err = pick_range(&repo, Some(&range)).unwrap_err();
        assert!(err.to_string().contains("v0.9.0"));

        let range = TagRange::new("v1.0.0", "v1.0.1");
        assert_eq!(pick_range(&repo, Some(&range)).unwrap(), range);
    }
}
