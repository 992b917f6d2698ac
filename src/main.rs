use std::process;

use clap::Parser;
use colored::Colorize;

use find_bzs::cli::Args;
use find_bzs::{app, Result};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("find_bzs")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(err) = initialize_logger(args.debug).and_then(|_| app::run(args)) {
        eprintln!("{} {}", "x".bright_red(), err);
        process::exit(1);
    }
}
