//! `sentinel compare`: week-over-week deltas between stored weeks.

use super::{parse_week, week_or_latest};
use crate::cli::CompareArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use sentinel_domain::traits::StateStore;
use sentinel_store::AnyStateStore;

/// Execute the compare command.
pub fn execute_compare(args: CompareArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = AnyStateStore::open(&config.store)?;
    let week = week_or_latest(&store, args.week.as_deref())?;

    let current = store
        .load(week)?
        .ok_or_else(|| CliError::WeekNotFound(week.to_string()))?;

    let previous = match args.against.as_deref() {
        Some(raw) => {
            let baseline = parse_week(raw)?;
            if baseline >= week {
                return Err(CliError::InvalidInput(format!(
                    "baseline {} must be earlier than {}",
                    baseline, week
                )));
            }
            Some(
                store
                    .load(baseline)?
                    .ok_or_else(|| CliError::WeekNotFound(baseline.to_string()))?,
            )
        }
        None => store.load_previous(week)?,
    };

    let deltas = sentinel_pipeline::compare(&current, previous.as_ref());
    println!(
        "{}",
        formatter.format_deltas(week, previous.as_ref().map(|p| p.week_key), &deltas)?
    );
    Ok(())
}
