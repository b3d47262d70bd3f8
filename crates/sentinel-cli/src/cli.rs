//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sentinel - weekly controversy monitoring for a portfolio of companies.
#[derive(Debug, Parser)]
#[command(name = "sentinel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SENTINEL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (ids and keys only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the weekly pipeline and store the result
    Run(RunArgs),

    /// Show the incidents stored for a week
    Show(ShowArgs),

    /// Compare a stored week against an earlier one
    Compare(CompareArgs),

    /// List stored weeks
    Weeks,

    /// Write a starter configuration file
    Init(InitArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// ISO week to report on (e.g. 2024-W17); defaults to last week
    #[arg(short, long)]
    pub week: Option<String>,

    /// Directory of per-company article files (<slug>.json)
    #[arg(short, long, env = "SENTINEL_NEWS_DIR")]
    pub news_dir: PathBuf,

    /// Classifier to use, overriding the configuration
    #[arg(long, value_enum)]
    pub classifier: Option<ClassifierArg>,

    /// Run everything but do not save the weekly state
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// ISO week to show; defaults to the latest stored week
    pub week: Option<String>,

    /// Only show this company
    #[arg(long)]
    pub company: Option<String>,
}

/// Arguments for the compare command.
#[derive(Debug, Parser)]
pub struct CompareArgs {
    /// ISO week to compare; defaults to the latest stored week
    pub week: Option<String>,

    /// Baseline week; defaults to the most recent week before `week`
    #[arg(short, long)]
    pub against: Option<String>,
}

/// Arguments for the init command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Classifier argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClassifierArg {
    /// LLM-backed classifier
    Llm,
    /// Offline keyword rules
    Keyword,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<ClassifierArg> for crate::config::ClassifierKind {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::Llm => crate::config::ClassifierKind::Llm,
            ClassifierArg::Keyword => crate::config::ClassifierKind::Keyword,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from([
            "sentinel",
            "run",
            "--week",
            "2024-W17",
            "--news-dir",
            "fixtures",
            "--classifier",
            "keyword",
        ]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.week.as_deref(), Some("2024-W17"));
                assert_eq!(args.news_dir, PathBuf::from("fixtures"));
                assert_eq!(args.classifier, Some(ClassifierArg::Keyword));
                assert!(!args.dry_run);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_compare_command() {
        let cli = Cli::parse_from(["sentinel", "compare", "2024-W17", "--against", "2024-W15", "-f", "json"]);
        assert_eq!(cli.format, Some(CliFormat::Json));
        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.week.as_deref(), Some("2024-W17"));
                assert_eq!(args.against.as_deref(), Some("2024-W15"));
            }
            _ => panic!("Expected Compare command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sentinel", "weeks", "--no-color", "--config", "/tmp/s.toml"]);
        assert!(cli.no_color);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
        assert!(matches!(cli.command, Command::Weeks));
    }

    #[test]
    fn test_classifier_conversion() {
        let kind: crate::config::ClassifierKind = ClassifierArg::Llm.into();
        assert_eq!(kind, crate::config::ClassifierKind::Llm);
    }
}
