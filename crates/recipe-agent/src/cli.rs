use clap::{Parser, Subcommand};
use rca_core::Mode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rca")]
#[command(about = "Recipe Agent: run question-answering recipes against a memoized answer service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/recipe-agent/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a recipe standalone or over input files
    Run {
        /// Recipe name or case-insensitive prefix
        #[arg(short, long)]
        recipe: String,

        /// machine = parallel over inputs, human = one at a time with transcript
        #[arg(long, value_enum, default_value_t = Mode::Machine)]
        mode: Mode,

        /// Input file; repeat for a batch
        #[arg(short, long = "input")]
        inputs: Vec<PathBuf>,

        /// Recipe arguments as a JSON object
        #[arg(long)]
        args: Option<String>,

        /// Concurrency ceiling for machine mode (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Keep going when a document fails; failures are reported at the end
        #[arg(long)]
        keep_going: bool,

        /// Append results to this file instead of stdout
        #[arg(long)]
        output_file: Option<PathBuf>,

        /// Write recipe JSON rows to this file
        #[arg(long)]
        json_out: Option<PathBuf>,

        /// Bypass the on-disk response cache for this run
        #[arg(long)]
        no_cache: bool,

        /// Also write logs to run-<timestamp>.log in this directory
        #[arg(long)]
        trace_dir: Option<PathBuf>,

        /// Render every question and answer
        #[arg(short, long)]
        verbose: bool,

        /// Caller location (lat,long) for conversational agents
        #[arg(long)]
        geolocation: Option<String>,

        /// Caller IP for conversational agents
        #[arg(long)]
        ip: Option<String>,
    },

    /// List registered recipes
    Recipes,

    /// Show/manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show effective configuration (API key redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a commented default config file if none exists
    Init,
}
