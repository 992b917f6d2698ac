use std::path::PathBuf;

use clap::Parser;

use crate::config::{LinkStyle, TagRange};

#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Older tag of the range (defaults to the second newest tag)
    #[clap(value_parser, requires = "new")]
    pub old: Option<String>,

    /// Newer tag of the range (defaults to the newest tag)
    #[clap(value_parser)]
    pub new: Option<String>,

    /// Repository to inspect
    #[clap(short, long, value_parser, default_value = ".")]
    pub repo: PathBuf,

    /// Config file (defaults to ~/.config/find-bzs/config.yaml)
    #[clap(short, long, value_parser, env = "FIND_BZS_CONFIG")]
    pub config: Option<PathBuf>,

    /// File holding the GitHub token (overrides the config file)
    #[clap(short, long, value_parser, env = "FIND_BZS_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// How to link to the tickets (overrides the config file)
    #[clap(short, long, value_enum)]
    pub link_style: Option<LinkStyle>,

    /// Print debug logs
    #[clap(short, long, value_parser, default_value_t = false)]
    pub debug: bool,
}

impl Args {
    /// The explicit tag pair, if both tags were given
    pub fn range(&self) -> Option<TagRange> {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => Some(TagRange::new(old, new)),
            _ => None,
        }
    }
}
