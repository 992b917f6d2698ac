use chrono::{Local, NaiveDate};
use colored::Colorize;

use crate::cli::Args;
use crate::config::{self, Config, RunOptions};
use crate::error::Result;
use crate::git::{GitRepository, SourceRepository};
use crate::github::GitHubClient;
use crate::pipeline::{pick_range, Correlation, Correlator};
use crate::remote::{self, Project};
use crate::template::{self, Report, ReportContext, SEPARATOR};
use crate::tickets::MarkerExtractor;
use crate::version::Described;

/// Main application entry point
pub fn run(args: Args) -> Result<()> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let mut config = Config::load(&config_path)?;
    if let Some(style) = args.link_style {
        config.tracker.link_style = style;
    }

    let token_path = args.token_file.clone().unwrap_or_else(|| config.token_path());
    let options = RunOptions {
        token: config::read_token(&token_path)?,
        repo_path: args.repo.clone(),
        range: args.range(),
    };

    let (report, correlation) = find_tickets(&config, &options, Local::now().date_naive())?;

    log::info!(
        "Found {} ticket(s) in {} merged PR(s) across {} commit(s)",
        correlation.tickets.len(),
        correlation.pull_requests.len(),
        correlation.commits
    );
    print_report(&report);

    Ok(())
}

/// Correlate the range and render the report
///
/// Nothing is printed; a fatal error leaves no partial report behind.
pub fn find_tickets(
    config: &Config,
    options: &RunOptions,
    date: NaiveDate,
) -> Result<(Report, Correlation)> {
    let repo = GitRepository::open(&options.repo_path)?;
    let project = remote::resolve_project(&repo.remotes()?, &config.github.host)?;
    log::debug!("Resolved project {}", project);

    let client = GitHubClient::new(project.clone(), options.token.clone())?;
    let extractor = MarkerExtractor::new(&config.tracker.marker);
    let range = pick_range(&repo, options.range.as_ref())?;
    let ctx = report_context(config, &repo, &project, &range.new, date)?;

    let correlation = Correlator::new(&client, &extractor).correlate_range(&repo, Some(&range))?;
    Ok((template::render(&ctx, &correlation), correlation))
}

fn report_context(
    config: &Config,
    repo: &GitRepository,
    project: &Project,
    tag: &str,
    date: NaiveDate,
) -> Result<ReportContext> {
    let described = Described::parse(&repo.describe(tag)?);

    let (git_name, git_email) = repo.identity();
    let author = config
        .changelog
        .author
        .clone()
        .or(git_name)
        .unwrap_or_else(|| "Unknown".to_string());
    let email = config.changelog.email.clone().or(git_email);

    Ok(ReportContext {
        date,
        author,
        email,
        package: config
            .package
            .name
            .clone()
            .unwrap_or_else(|| project.name.clone()),
        tag: tag.to_string(),
        described,
        tracker: config.tracker.clone(),
        targets: config.targets.0.clone(),
        width: config.changelog.width,
    })
}

fn print_report(report: &Report) {
    for section in &report.sections {
        println!("{}", SEPARATOR.bright_green());
        if let Some(title) = &section.title {
            println!("{}", title.bright_cyan());
        }
        for line in &section.lines {
            println!("{}", line);
        }
    }
}
