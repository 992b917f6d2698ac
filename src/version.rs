//! Downstream package versions derived from `git describe --tags`
//!
//! A tagged ref describes as the bare tag (`v3.0.0rc1`); anything else
//! describes as `<tag>-<commits>-g<sha>`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNTAGGED: Regex = Regex::new(r"^(.+)-(\d+)-(g[0-9a-f]+)$").unwrap();
}

/// Pre-release milestones, checked in this order
const MILESTONES: [&str; 2] = ["beta", "rc"];

/// Release used for tagged Debian builds
const DEB_RELEASE: &str = "2redhat1";

/// A parsed `git describe` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Described {
    /// Tag name without a leading `v`
    pub version: String,
    /// Commits since the tag and the abbreviated `g<sha>`, for untagged refs
    pub distance: Option<(u32, String)>,
}

impl Described {
    pub fn parse(describe: &str) -> Self {
        let describe = describe.trim();
        let (tag, distance) = match UNTAGGED.captures(describe) {
            Some(caps) => {
                let commits = caps[2].parse::<u32>().unwrap_or(0);
                (caps[1].to_string(), Some((commits, caps[3].to_string())))
            }
            None => (describe.to_string(), None),
        };

        Self {
            version: upstream_version(&tag),
            distance,
        }
    }

    /// Version-release string for an RPM `%changelog` entry
    pub fn rpm(&self) -> String {
        match &self.distance {
            Some((commits, sha)) => {
                let mut version = self.version.clone();
                let mut release = format!("{}.{}", commits, sha);
                if let Some((base, rc)) = split_milestone(&version, "rc") {
                    release = format!("0.1.rc{}.{}", rc, release);
                    version = base;
                }
                format!("{}-{}", version, release)
            }
            None => {
                for milestone in MILESTONES {
                    if let Some((base, value)) = split_milestone(&self.version, milestone) {
                        return format!("{}-0.1.{}{}", base, milestone, value);
                    }
                }
                format!("{}-1", self.version)
            }
        }
    }

    /// Version-release string for a `debian/changelog` entry
    pub fn deb(&self) -> String {
        let mut version = self.version.clone();
        for milestone in MILESTONES {
            if let Some((base, value)) = split_milestone(&version, milestone) {
                version = format!("{}~{}{}", base, milestone, value);
                break;
            }
        }

        match &self.distance {
            Some((commits, sha)) => format!("{}-{}.{}", version, commits, sha),
            None => format!("{}-{}", version, DEB_RELEASE),
        }
    }

    pub fn is_prerelease(&self) -> bool {
        MILESTONES.iter().any(|m| self.version.contains(m))
    }
}

/// Strip the leading `v` from a tag name
pub fn upstream_version(tag: &str) -> String {
    tag.strip_prefix('v').unwrap_or(tag).to_string()
}

/// "3.0.0rc1" -> ("3.0.0", "1"); separators before the milestone are dropped
fn split_milestone(version: &str, milestone: &str) -> Option<(String, String)> {
    let index = version.find(milestone)?;
    let base = version[..index].trim_end_matches(['-', '.', '~', '_']);
    let value = &version[index + milestone.len()..];
    Some((base.to_string(), value.to_string()))
}
