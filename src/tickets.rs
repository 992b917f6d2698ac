//! Tracker ticket references
//!
//! Pull request descriptions link to tracker tickets with a fixed marker
//! followed by the numeric ticket id (e.g. "Fixes rhbz#1507907").

use std::collections::HashSet;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

/// Marker used by the Red Hat Bugzilla external tracker convention
pub const DEFAULT_MARKER: &str = "rhbz#";

lazy_static! {
    static ref DEFAULT_PATTERN: Regex = marker_pattern(DEFAULT_MARKER);
}

/// Numeric tracker ticket id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pulls ticket ids out of free text
pub trait TicketExtractor {
    /// Returns the ids referenced in `text`, in order of appearance
    fn extract(&self, text: &str) -> Vec<TicketId>;
}

/// Case-insensitive `<marker><digits>` matcher
#[derive(Debug, Clone)]
pub struct MarkerExtractor {
    pattern: Regex,
}

impl MarkerExtractor {
    pub fn new(marker: &str) -> Self {
        if marker.eq_ignore_ascii_case(DEFAULT_MARKER) {
            return Self::default();
        }
        Self {
            pattern: marker_pattern(marker),
        }
    }
}

impl Default for MarkerExtractor {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl TicketExtractor for MarkerExtractor {
    fn extract(&self, text: &str) -> Vec<TicketId> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| m.as_str().parse::<u64>().ok())
            .map(TicketId)
            .collect()
    }
}

fn marker_pattern(marker: &str) -> Regex {
    let leading = if marker.starts_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    let pattern = format!(r"(?i){}{}(\d+)\b", leading, regex::escape(marker));
    // The marker is escaped, so the pattern is always valid.
    Regex::new(&pattern).expect("escaped marker pattern")
}

/// Unique ticket ids in order of first discovery
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TicketSet {
    order: Vec<TicketId>,
    seen: HashSet<TicketId>,
}

impl TicketSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` unless already present. Returns whether it was new.
    pub fn insert(&mut self, id: TicketId) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub fn extend<I: IntoIterator<Item = TicketId>>(&mut self, ids: I) {
        for id in ids {
            self.insert(id);
        }
    }

    pub fn as_slice(&self) -> &[TicketId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<TicketId> for TicketSet {
    fn from_iter<I: IntoIterator<Item = TicketId>>(iter: I) -> Self {
        let mut set = TicketSet::new();
        set.extend(iter);
        set
    }
}
