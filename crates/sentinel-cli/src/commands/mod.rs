//! Command implementations.

pub mod compare;
pub mod init;
pub mod run;
pub mod show;
pub mod weeks;

pub use self::compare::execute_compare;
pub use self::init::execute_init;
pub use self::run::{execute_run, run_pipeline};
pub use self::show::execute_show;
pub use self::weeks::execute_weeks;

use crate::error::{CliError, Result};
use chrono::NaiveDate;
use sentinel_domain::traits::StateStore;
use sentinel_domain::WeekKey;
use sentinel_store::AnyStateStore;

/// Parse a `YYYY-Www` week argument.
pub fn parse_week(raw: &str) -> Result<WeekKey> {
    raw.trim()
        .parse()
        .map_err(|e| CliError::InvalidInput(format!("invalid week '{}': {}", raw, e)))
}

/// The last complete ISO week before `today`.
pub fn last_complete_week(today: NaiveDate) -> WeekKey {
    WeekKey::from_date(today).previous()
}

/// The requested week, or the latest stored one.
fn week_or_latest(store: &AnyStateStore, raw: Option<&str>) -> Result<WeekKey> {
    match raw {
        Some(raw) => parse_week(raw),
        None => store
            .list_weeks()?
            .last()
            .copied()
            .ok_or_else(|| CliError::WeekNotFound("(none stored yet)".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_week() {
        assert_eq!(parse_week(" 2024-W17 ").unwrap().to_string(), "2024-W17");
        assert!(matches!(parse_week("2024-17"), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_last_complete_week() {
        // Wednesday of 2024-W18
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(last_complete_week(today).to_string(), "2024-W17");

        // First days of January belong to the previous ISO year
        let today = NaiveDate::from_ymd_opt(2021, 1, 6).unwrap();
        assert_eq!(last_complete_week(today).to_string(), "2020-W53");
    }
}
