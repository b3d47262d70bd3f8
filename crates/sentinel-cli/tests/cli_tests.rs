//! End-to-end runs of the CLI over article directories with the keyword
//! classifier and an on-disk store.

use sentinel_cli::cli::{ClassifierArg, RunArgs};
use sentinel_cli::commands::{parse_week, run_pipeline};
use sentinel_cli::config::{ClassifierKind, Config};
use sentinel_cli::CliError;
use sentinel_domain::traits::StateStore;
use sentinel_domain::{Company, CompanyStatus, IncidentStatus, Trend};
use sentinel_store::{AnyStateStore, StoreBackend};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const INQUIRY: &str = r#"{"title": "Regulators open probe into Acme Corp", "url": "https://news.example/inquiry", "source": "Reuters", "date": "2024-04-19", "language": "en", "snippet": "The investigation concerns pricing."}"#;
const INQUIRY_FOLLOWUP: &str = r#"{"title": "Regulators open probe into Acme Corp units", "url": "https://news.example/inquiry-followup", "source": "Reuters", "date": "2024-04-22", "language": "en", "snippet": "The investigation widens."}"#;
const STRIKE: &str = r#"{"title": "Acme Corp workers walk out in strike", "url": "https://news.example/strike", "source": "Local Paper", "date": "2024-04-17", "language": "en", "snippet": "Union leaders called the strike."}"#;
const SPILL: &str = r#"{"title": "Chemical spill at Acme Corp plant", "url": "https://news.example/spill", "source": "Local Paper", "date": "2024-04-23", "language": "en", "snippet": "Residents were evacuated."}"#;

fn news_dir(root: &Path, name: &str, articles: &[&str]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("acme-corp.json"), format!("[{}]", articles.join(","))).unwrap();
    dir
}

fn config(root: &Path) -> Config {
    let mut config = Config::default();
    config.classifier = ClassifierKind::Llm;
    config.store.backend = StoreBackend::Sqlite;
    config.store.path = root.join("state.db");
    config.companies = vec![Company::new("Acme Corp", "ACME"), Company::new("Globex", "GLBX")];
    config
}

fn run_args(week: &str, news_dir: PathBuf) -> RunArgs {
    RunArgs {
        week: Some(week.to_string()),
        news_dir,
        classifier: Some(ClassifierArg::Keyword),
        dry_run: false,
        output: None,
    }
}

#[tokio::test]
async fn test_two_week_run_tracks_trends() {
    let root = TempDir::new().unwrap();
    let config = config(root.path());

    // One feed spanning both weeks; each run only sees its own week
    let news = news_dir(root.path(), "news", &[INQUIRY, STRIKE, INQUIRY_FOLLOWUP, SPILL]);

    let first = run_pipeline(&run_args("2024-W16", news.clone()), &config).await.unwrap();
    assert!(first.saved);
    assert_eq!(first.report.baseline_week, None);
    let w16 = first.state.snapshot("Acme Corp").unwrap();
    assert_eq!(w16.incidents.len(), 2);
    assert!(w16
        .incidents
        .iter()
        .flat_map(|i| &i.evidence_urls)
        .all(|url| !url.ends_with("/spill") && !url.ends_with("/inquiry-followup")));

    let globex = first.report.companies.iter().find(|c| c.company_ref == "Globex").unwrap();
    assert_eq!(globex.status, CompanyStatus::NoData);

    let second = run_pipeline(&run_args("2024-W17", news), &config).await.unwrap();
    assert_eq!(second.report.baseline_week, Some(parse_week("2024-W16").unwrap()));

    let acme = second.state.snapshot("Acme Corp").unwrap();
    let statuses: Vec<IncidentStatus> = acme.incidents.iter().map(|i| i.status).collect();
    assert!(statuses.contains(&IncidentStatus::Continuing));
    assert!(statuses.contains(&IncidentStatus::New));
    assert_eq!(acme.incidents.len(), 2);

    let delta = &second.deltas["Acme Corp"];
    assert_eq!(delta.new_incident_ids.len(), 1);
    assert_eq!(delta.resolved_incident_ids.len(), 1);
    assert_eq!(delta.count_delta, 0);
    assert_eq!(delta.trend, Trend::Stable);

    let store = AnyStateStore::open(&config.store).unwrap();
    let weeks: Vec<String> = store.list_weeks().unwrap().iter().map(|w| w.to_string()).collect();
    assert_eq!(weeks, vec!["2024-W16", "2024-W17"]);
}

#[tokio::test]
async fn test_dry_run_stores_nothing() {
    let root = TempDir::new().unwrap();
    let config = config(root.path());

    let mut args = run_args("2024-W16", news_dir(root.path(), "w16", &[INQUIRY]));
    args.dry_run = true;

    let outcome = run_pipeline(&args, &config).await.unwrap();
    assert!(!outcome.saved);
    assert_eq!(outcome.report.companies.len(), 2);

    let store = AnyStateStore::open(&config.store).unwrap();
    assert!(store.list_weeks().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_portfolio_is_rejected() {
    let root = TempDir::new().unwrap();
    let mut config = config(root.path());
    config.companies.clear();

    let result = run_pipeline(&run_args("2024-W16", news_dir(root.path(), "w16", &[])), &config).await;
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[tokio::test]
async fn test_bad_week_and_missing_news_dir() {
    let root = TempDir::new().unwrap();
    let config = config(root.path());

    let result = run_pipeline(&run_args("week 16", news_dir(root.path(), "w16", &[])), &config).await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));

    let result = run_pipeline(&run_args("2024-W16", root.path().join("nowhere")), &config).await;
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}
