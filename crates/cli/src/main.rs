use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "querydesk")]
#[command(about = "QueryDesk tab search CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// Show version information
    #[command(name = "-version")]
    Version,

    /// Show help and available actions
    #[command(name = "-help")]
    Help,

    /// Search every tab of a saved session
    #[command(name = "-search")]
    Search(SearchArgs),

    /// Display current configuration
    #[command(name = "-show-config")]
    ShowConfig,

    /// Validate configuration file
    #[command(name = "-validate-config")]
    ValidateConfig,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Text or pattern to look for
    pub query: String,

    /// Session file to search
    #[arg(long)]
    pub session: PathBuf,

    #[arg(long)]
    pub case_sensitive: bool,

    #[arg(long)]
    pub whole_word: bool,

    /// Treat the query as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Leave closed tabs out of the results
    #[arg(long)]
    pub exclude_closed: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.action {
        Some(Action::Version) => commands::version::run(),
        Some(Action::Help) => commands::help::run(),
        Some(Action::Search(args)) => commands::search::run(&args),
        Some(Action::ShowConfig) => commands::show_config::run(),
        Some(Action::ValidateConfig) => commands::validate_config::run(),
        None => {
            // No subcommand: show help
            commands::help::run();
        }
    }
}
