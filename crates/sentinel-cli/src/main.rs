//! Sentinel CLI - weekly incident analysis for a company portfolio.

use clap::Parser;
use sentinel_cli::commands;
use sentinel_cli::config::OutputFormat;
use sentinel_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> sentinel_cli::Result<()> {
    let cli = Cli::parse();

    let color_flag = !cli.no_color;
    let format_flag = cli.format.map(Into::into);

    // init must work before any config file exists
    let command = match cli.command {
        Command::Init(args) => {
            let formatter = Formatter::new(format_flag.unwrap_or(OutputFormat::Table), color_flag);
            return commands::execute_init(&args, cli.config.as_deref(), &formatter);
        }
        command => command,
    };

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_process_env()?;

    let format = format_flag.unwrap_or(config.settings.format);
    let formatter = Formatter::new(format, color_flag && config.settings.color);

    match command {
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await?,
        Command::Show(args) => commands::execute_show(args, &config, &formatter)?,
        Command::Compare(args) => commands::execute_compare(args, &config, &formatter)?,
        Command::Weeks => commands::execute_weeks(&config, &formatter)?,
        Command::Init(_) => {}
    }

    Ok(())
}
