//! CLI argument definitions for the datatool binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "datatool",
    version,
    about = "Inspect and convert datatool databases",
    long_about = "Read, convert, sort and display tabular databases.\n\n\
                  Supports delimited text (CSV/TSV) and the persisted token\n\
                  formats dbtex and dtltex, versions 2.0 and 3.0."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for silence).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read a database and write it in another format.
    Convert(ConvertArgs),

    /// Render a database as a table on stdout.
    Show(ShowArgs),

    /// Sort a database by a column and write the result.
    Sort(SortArgs),

    /// Print the structure of a database.
    Info(InfoArgs),
}

/// Options shared by every command that reads a database.
#[derive(Args)]
pub struct ReadArgs {
    /// Input file (.csv, .tsv, .dbtex or .dtltex).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// I/O setting as key=value (e.g. separator=;, csv-blank=end,
    /// no-header=true). Repeatable; applies to the input file.
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE")]
    pub options: Vec<String>,
}

/// Options shared by every command that writes a database.
#[derive(Args)]
pub struct WriteArgs {
    /// Output file; its extension picks the format unless overridden.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// I/O setting as key=value for the output file (e.g. format=dbtex,
    /// version=2.0, add-delimiter=always). Repeatable.
    #[arg(long = "output-option", short = 'O', value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Replace the output file if it already exists.
    #[arg(long = "overwrite")]
    pub overwrite: bool,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub read: ReadArgs,

    #[command(flatten)]
    pub write: WriteArgs,

    /// Store the database under this name instead of the one derived
    /// from the input.
    #[arg(long = "name", value_name = "NAME")]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub read: ReadArgs,

    /// Show at most this many rows.
    #[arg(long = "max-rows", value_name = "N")]
    pub max_rows: Option<usize>,
}

#[derive(Args)]
pub struct SortArgs {
    #[command(flatten)]
    pub read: ReadArgs,

    #[command(flatten)]
    pub write: WriteArgs,

    /// Column key to sort by.
    #[arg(long = "by", value_name = "KEY")]
    pub by: String,

    /// Sort in descending order.
    #[arg(long = "descending")]
    pub descending: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub read: ReadArgs,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
