use anyhow::Result;
use clap::{Parser, Subcommand};

use retitle::cli::{self, OutputFormat, StripOptions};

#[derive(Debug, Parser)]
#[command(name = "retitle")]
#[command(about = "Strip site-name suffixes from titles through a configurable step pipeline")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the pipeline over each TITLE, or over each stdin line when none are given
    Strip {
        /// Titles to transform
        titles: Vec<String>,
        /// Comma-separated step names, overriding the configured pipeline
        #[arg(long)]
        steps: Option<String>,
        /// Do not echo audit messages to stderr
        #[arg(long, short)]
        quiet: bool,
        /// Append audit messages to the JSONL audit log
        #[arg(long)]
        log: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the built-in transform steps
    Steps,
    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        last: usize,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration and its sources
    Show,
    /// Write the default config to ~/.retitle/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key (e.g. `pipeline.steps pipe,hyphen`) in the global config
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Strip {
            titles,
            steps,
            quiet,
            log,
            format,
        } => {
            let opts = StripOptions { steps, quiet, log };
            cli::run_strip(titles, &opts, format)
        }
        Commands::Steps => cli::run_steps(),
        Commands::Audit { last, format } => cli::run_audit(last, format),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
