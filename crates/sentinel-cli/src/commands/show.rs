//! `sentinel show`: print a stored week.

use super::week_or_latest;
use crate::cli::ShowArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use sentinel_domain::traits::StateStore;
use sentinel_store::AnyStateStore;

/// Execute the show command.
pub fn execute_show(args: ShowArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = AnyStateStore::open(&config.store)?;
    let week = week_or_latest(&store, args.week.as_deref())?;

    let state = store
        .load(week)?
        .ok_or_else(|| CliError::WeekNotFound(week.to_string()))?;

    if let Some(company) = args.company.as_deref() {
        if !state.snapshots.contains_key(company) {
            return Err(CliError::InvalidInput(format!(
                "company '{}' has no snapshot in {}",
                company, week
            )));
        }
    }

    println!("{}", formatter.format_state(&state, args.company.as_deref())?);
    Ok(())
}
