//! Report rendering
//!
//! Everything here is pure formatting: the changelog entry, the dist-git
//! commands, tracker links and the bulk update command are built from the
//! ticket list and a [`ReportContext`], without touching git or the network.

use std::fmt;

use chrono::NaiveDate;

use crate::config::{LinkStyle, PackageFormat, PackagingTool, Target, TrackerConfig};
use crate::pipeline::Correlation;
use crate::tickets::TicketId;
use crate::version::{upstream_version, Described};

/// Line separating report sections
pub const SEPARATOR: &str = "================";

/// Inputs to the report besides the tickets themselves
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub date: NaiveDate,
    pub author: String,
    pub email: Option<String>,
    pub package: String,
    /// The newer tag of the range
    pub tag: String,
    /// `git describe --tags` of the newer tag
    pub described: Described,
    pub tracker: TrackerConfig,
    pub targets: Vec<Target>,
    pub width: usize,
}

/// One titled block of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    pub lines: Vec<String>,
}

impl Section {
    fn new(title: Option<String>, lines: Vec<String>) -> Self {
        Self { title, lines }
    }
}

/// The rendered report, printable as plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub sections: Vec<Section>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "{}", SEPARATOR)?;
            if let Some(title) = &section.title {
                writeln!(f, "{}", title)?;
            }
            for line in &section.lines {
                writeln!(f, "{}", line)?;
            }
        }
        Ok(())
    }
}

/// Build the full report for a correlation run
pub fn render(ctx: &ReportContext, correlation: &Correlation) -> Report {
    let tickets = correlation.tickets.as_slice();
    let mut sections = Vec::new();

    let mut changelog_lines: Vec<String> = changelog(ctx, tickets)
        .lines()
        .map(String::from)
        .collect();
    if tickets.is_empty() {
        changelog_lines.push(String::new());
        changelog_lines.push("No tickets found in this range.".to_string());
    }
    sections.push(Section::new(None, changelog_lines));

    for target in &ctx.targets {
        if let Some(command) = packaging_command(ctx, target, tickets) {
            sections.push(Section::new(
                Some(format!("Command for {} dist-git:", target.name)),
                vec![command],
            ));
        }
    }

    if !tickets.is_empty() {
        sections.push(Section::new(
            Some("Query for browsing:".to_string()),
            browse_links(&ctx.tracker, tickets),
        ));
        sections.push(Section::new(
            Some("When all dist-git targets are committed:".to_string()),
            vec![bulk_update_command(ctx, tickets)],
        ));
    }

    if !correlation.unresolved.is_empty() {
        sections.push(Section::new(
            Some("Commits without a merged pull request:".to_string()),
            correlation.unresolved.clone(),
        ));
    }

    Report { sections }
}

/// RPM `%changelog` entry for the new version
pub fn changelog(ctx: &ReportContext, tickets: &[TicketId]) -> String {
    let mut description = format!("Update to v{}", ctx.described.version);
    if !tickets.is_empty() {
        let references: Vec<String> = tickets
            .iter()
            .map(|id| reference(&ctx.tracker, id))
            .collect();
        description = format!("{} ({})", description, references.join(", "));
    }

    let author = match &ctx.email {
        Some(email) => format!("{} <{}>", ctx.author, email),
        None => ctx.author.clone(),
    };

    format!(
        "* {} {} - {}\n{}\n",
        ctx.date.format("%a %b %d %Y"),
        author,
        ctx.described.rpm(),
        wrap(&description, ctx.width, "- ", "  ")
    )
}

/// Command importing the new version into a target's dist-git
///
/// `rdopkg` is skipped for beta and rc versions.
pub fn packaging_command(
    ctx: &ReportContext,
    target: &Target,
    tickets: &[TicketId],
) -> Option<String> {
    let mut command = match target.tool {
        PackagingTool::Rdopkg => {
            if ctx.described.is_prerelease() {
                return None;
            }
            format!("rdopkg new-version {}", upstream_version(&ctx.tag))
        }
        PackagingTool::Rhcephpkg => "rhcephpkg new-version".to_string(),
    };

    if !tickets.is_empty() {
        let references: Vec<String> = tickets
            .iter()
            .map(|id| reference(&ctx.tracker, id))
            .collect();
        command = format!("{} -B \"{}\"", command, references.join(" "));
    }

    Some(command)
}

/// Tracker URLs for browsing the tickets
pub fn browse_links(tracker: &TrackerConfig, tickets: &[TicketId]) -> Vec<String> {
    let base = tracker.url.trim_end_matches('/');
    match tracker.link_style {
        LinkStyle::Query => {
            let ids: Vec<String> = tickets.iter().map(|id| id.to_string()).collect();
            vec![format!("{}/buglist.cgi?bug_id={}", base, ids.join(","))]
        }
        LinkStyle::PerTicket => tickets
            .iter()
            .map(|id| format!("{}/show_bug.cgi?id={}", base, id))
            .collect(),
    }
}

/// `bugzilla` CLI invocation moving every ticket to the fixed state
pub fn bulk_update_command(ctx: &ReportContext, tickets: &[TicketId]) -> String {
    let fixed_in: Vec<String> = ctx
        .targets
        .iter()
        .map(|target| format!("{}: {}", target.name, build_identifier(ctx, target)))
        .collect();
    let ids: Vec<String> = tickets.iter().map(|id| id.to_string()).collect();

    format!(
        "bugzilla modify -s {} -F \"{}\" {}",
        ctx.tracker.status,
        fixed_in.join(" "),
        ids.join(" ")
    )
}

/// Package build name for a target, e.g. `ceph-ansible-3.0.0-1.el7cp`
pub fn build_identifier(ctx: &ReportContext, target: &Target) -> String {
    let (separator, version) = match target.format {
        PackageFormat::Rpm => ('-', ctx.described.rpm()),
        PackageFormat::Deb => ('_', ctx.described.deb()),
    };
    format!("{}{}{}{}", ctx.package, separator, version, target.build_suffix)
}

fn reference(tracker: &TrackerConfig, id: &TicketId) -> String {
    format!("{}{}", tracker.marker, id)
}

/// Greedy word wrap with separate first-line and continuation indents
fn wrap(text: &str, width: usize, initial: &str, subsequent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = initial.to_string();
    let mut indent_len = initial.len();

    for word in text.split_whitespace() {
        let has_words = current.len() > indent_len;
        if has_words && current.len() + 1 + word.len() > width {
            lines.push(current);
            current = subsequent.to_string();
            indent_len = subsequent.len();
        }
        if current.len() > indent_len {
            current.push(' ');
        }
        current.push_str(word);
    }
    lines.push(current);

    lines.join("\n")
}
