//! Command line argument parsing for the wikiseek CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::Result;
use crate::search::PrefixMatch;

/// Wikiseek - title lookup over MediaWiki dumps
#[derive(Parser, Debug, Clone)]
#[command(name = "wikiseek")]
#[command(about = "Index a MediaWiki XML dump and look up articles by title")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct WikiseekArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Settings file (JSON)
    #[arg(short, long, value_name = "FILE", env = "WIKISEEK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the dump and index files
    #[arg(short = 'd', long, value_name = "DIR", env = "WIKISEEK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding the chunk files (default: <DATA_DIR>/chunks)
    #[arg(long, value_name = "DIR")]
    pub chunk_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl WikiseekArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }

    /// Resolve settings: the settings file if given, then directory flags on
    /// top.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_json_file(path)?,
            None => Settings::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            settings.data_dir = data_dir.clone();
            if self.chunk_dir.is_none() {
                settings.chunk_dir = data_dir.join("chunks");
            }
        }
        if let Some(chunk_dir) = &self.chunk_dir {
            settings.chunk_dir = chunk_dir.clone();
        }

        Ok(settings)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Index a dump and sort the index
    Build(IndexArgs),

    /// Index a dump without sorting
    Index(IndexArgs),

    /// Sort the unsorted index
    Sort,

    /// Look up titles in the sorted index
    Search(SearchArgs),

    /// Print the raw text of an article
    Read(ReadArgs),

    /// Look up a title and print its article
    Lookup(LookupArgs),

    /// Interactive lookup loop reading queries from stdin
    Shell(ShellArgs),
}

/// Arguments for indexing
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    /// Dump file (default: the configured dump in the data directory)
    #[arg(value_name = "DUMP")]
    pub dump: Option<PathBuf>,

    /// Articles per chunk file
    #[arg(long, value_name = "N")]
    pub chunk_capacity: Option<usize>,
}

impl IndexArgs {
    /// Apply these arguments to `settings`. A dump path given on the command
    /// line is taken relative to the working directory, not the data
    /// directory.
    pub fn apply(&self, settings: &mut Settings) -> Result<()> {
        if let Some(dump) = &self.dump {
            settings.dump_file = std::path::absolute(dump)?.to_string_lossy().into_owned();
        }
        if let Some(capacity) = self.chunk_capacity {
            settings.chunk_capacity = capacity;
        }
        Ok(())
    }
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Titles to look up
    #[arg(value_name = "QUERY", required = true)]
    pub queries: Vec<String>,

    /// Disambiguation rule for queries without an exact match
    #[arg(long, value_name = "RULE")]
    pub prefix_match: Option<PrefixMatchArg>,

    /// Maximum redirect hops
    #[arg(long, value_name = "N")]
    pub max_redirect_depth: Option<usize>,
}

/// Arguments for reading an article
#[derive(Parser, Debug, Clone)]
pub struct ReadArgs {
    /// Chunk id
    #[arg(value_name = "CHUNK_ID")]
    pub chunk_id: u64,

    /// Article id
    #[arg(value_name = "ARTICLE_ID")]
    pub article_id: String,
}

/// Arguments for looking up an article
#[derive(Parser, Debug, Clone)]
pub struct LookupArgs {
    /// Title to look up
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Print only the lead sentence
    #[arg(short, long)]
    pub short: bool,

    /// Print the raw wiki markup
    #[arg(long, conflicts_with = "short")]
    pub raw: bool,
}

/// Arguments for the interactive shell
#[derive(Parser, Debug, Clone)]
pub struct ShellArgs {
    /// Print only the lead sentence of found articles
    #[arg(short, long)]
    pub short: bool,
}

/// Disambiguation rules selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixMatchArg {
    /// Titles continuing with "-" or " "
    Separator,
    /// Any title starting with the query
    Plain,
}

impl From<PrefixMatchArg> for PrefixMatch {
    fn from(arg: PrefixMatchArg) -> Self {
        match arg {
            PrefixMatchArg::Separator => PrefixMatch::Separator,
            PrefixMatchArg::Plain => PrefixMatch::Plain,
        }
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
