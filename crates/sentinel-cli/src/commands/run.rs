//! `sentinel run`: analyze a week and store the result.

use super::{last_complete_week, parse_week};
use crate::cli::RunArgs;
use crate::config::{ClassifierKind, Config};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::source::DirectorySource;
use chrono::Utc;
use sentinel_domain::traits::Classifier;
use sentinel_domain::WeekKey;
use sentinel_extractor::{Extractor, KeywordClassifier, LlmClassifier};
use sentinel_llm::AnyProvider;
use sentinel_pipeline::{Pipeline, RunOutcome};
use sentinel_store::AnyStateStore;
use std::fs;
use tracing::info;

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let output = args.output.clone();
    let outcome = run_pipeline(&args, config).await?;

    println!("{}", formatter.format_report(&outcome.report)?);

    if let Some(path) = output {
        fs::write(&path, serde_json::to_string_pretty(&outcome.report)?)?;
        eprintln!("{}", formatter.info(&format!("Report written to {}", path.display())));
    }

    eprintln!("{}", formatter.info(&outcome.metrics.summary()));
    if outcome.saved {
        eprintln!("{}", formatter.success(&format!("Stored state for {}", outcome.state.week_key)));
    } else {
        eprintln!("{}", formatter.warning("Dry run, state not stored"));
    }
    Ok(())
}

/// Run the pipeline for the week named in `args` and return the outcome.
pub async fn run_pipeline(args: &RunArgs, config: &Config) -> Result<RunOutcome> {
    let week = match args.week.as_deref() {
        Some(raw) => parse_week(raw)?,
        None => last_complete_week(Utc::now().date_naive()),
    };

    let mut config = config.clone();
    if let Some(classifier) = args.classifier {
        config.classifier = classifier.into();
    }
    config.pipeline.dry_run |= args.dry_run;
    config.validate()?;

    if config.companies.is_empty() {
        return Err(CliError::Config(
            "no companies configured, add [[companies]] entries to the config file".into(),
        ));
    }
    if !args.news_dir.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "news directory {} does not exist",
            args.news_dir.display()
        )));
    }

    info!(week = %week, companies = config.companies.len(), classifier = ?config.classifier, "Starting run");

    let source = DirectorySource::new(&args.news_dir);
    let store = AnyStateStore::open(&config.store)?;

    match config.classifier {
        ClassifierKind::Keyword => run_with(KeywordClassifier::new(), &config, source, store, week).await,
        ClassifierKind::Llm => {
            let provider = AnyProvider::from_config(&config.llm)?;
            run_with(LlmClassifier::new(provider), &config, source, store, week).await
        }
    }
}

async fn run_with<C: Classifier>(
    classifier: C,
    config: &Config,
    source: DirectorySource,
    store: AnyStateStore,
    week: WeekKey,
) -> Result<RunOutcome> {
    let extractor = Extractor::new(classifier, config.extractor.clone());
    let mut pipeline = Pipeline::new(extractor, source, store, config.pipeline.clone())?;
    Ok(pipeline.run(week, &config.companies).await?)
}
