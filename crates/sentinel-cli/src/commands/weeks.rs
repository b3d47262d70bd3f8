//! `sentinel weeks`: list stored weeks.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use sentinel_domain::traits::StateStore;
use sentinel_store::AnyStateStore;

/// Execute the weeks command.
pub fn execute_weeks(config: &Config, formatter: &Formatter) -> Result<()> {
    let store = AnyStateStore::open(&config.store)?;
    let weeks = store.list_weeks()?;
    println!("{}", formatter.format_weeks(&weeks)?);
    Ok(())
}
