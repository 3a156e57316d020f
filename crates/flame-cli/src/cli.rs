use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "FLAME++ CLI - Propagate multi-charge-state ion beams through a linac lattice with the linear moment-matrix engine.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used by parameter scans.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Propagate the initial beam through a lattice and report the state after each element.
    Run(RunArgs),
    /// List the elements of a lattice.
    Info(InfoArgs),
    /// Scan one element parameter and report the final beam for each value.
    Scan(ScanArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Lattice document (TOML, or JSON with a .json extension).
    #[arg(value_name = "LATTICE")]
    pub lattice: PathBuf,

    /// Index of the first element to apply.
    #[arg(long, default_value_t = 0, value_name = "INDEX")]
    pub start: usize,

    /// Maximum number of elements to apply. Defaults to the rest of the lattice.
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,

    /// Write the per-element history to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit the history as JSON instead of CSV.
    #[arg(long)]
    pub json: bool,

    /// Override a beam parameter of the initial state.
    /// Can be used multiple times. Example: --set IonEk=1.5e6
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Lattice document (TOML, or JSON with a .json extension).
    #[arg(value_name = "LATTICE")]
    pub lattice: PathBuf,
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Lattice document (TOML, or JSON with a .json extension).
    #[arg(value_name = "LATTICE")]
    pub lattice: PathBuf,

    /// Name of the element to reconfigure.
    #[arg(short, long, value_name = "NAME")]
    pub element: String,

    /// Parameter of the element to scan (e.g. 'B2').
    #[arg(short, long, value_name = "KEY")]
    pub param: String,

    /// Comma-separated parameter values.
    #[arg(long, value_name = "LIST", value_delimiter = ',', required = true)]
    pub values: Vec<f64>,

    /// Write the scan table to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override a beam parameter of the initial state.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}
