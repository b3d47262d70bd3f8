//! Sentinel Storage Layer
//!
//! Implements the `StateStore` trait: one immutable `WeeklyState` per ISO
//! week, with "previous week" lookup for week-over-week comparison.
//!
//! # Backends
//!
//! - `SqliteStateStore`: one row per week, replaced transactionally
//! - `FileStateStore`: one JSON file per week, written via temp file + rename
//! - `AnyStateStore`: configuration-selected variant of the two
//!
//! # Examples
//!
//! ```no_run
//! use sentinel_store::SqliteStateStore;
//! use sentinel_domain::traits::StateStore;
//! use sentinel_domain::WeekKey;
//!
//! let store = SqliteStateStore::new("sentinel.db").unwrap();
//! let baseline = store.load_previous(WeekKey::new(2024, 17).unwrap()).unwrap();
//! ```

#![warn(missing_docs)]

mod config;
mod file_store;

pub use config::{StoreBackend, StoreConfig};
pub use file_store::FileStateStore;

use rusqlite::{params, Connection, OptionalExtension};
use sentinel_domain::traits::StateStore;
use sentinel_domain::{WeekKey, WeeklyState};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// State could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data is inconsistent
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of StateStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. The pipeline reads once before
/// processing and writes once after assembly, from a single task.
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Open (or create) a store at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn decode(week_key: &str, payload: &str) -> Result<WeeklyState, StoreError> {
        let state: WeeklyState = serde_json::from_str(payload)?;
        if state.week_key.to_string() != week_key {
            return Err(StoreError::InvalidData(format!(
                "Row {} holds state for {}",
                week_key, state.week_key
            )));
        }
        Ok(state)
    }
}

impl StateStore for SqliteStateStore {
    type Error = StoreError;

    fn load_previous(&self, before: WeekKey) -> Result<Option<WeeklyState>, Self::Error> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT week_key, payload FROM weekly_states
                 WHERE iso_year < ?1 OR (iso_year = ?1 AND iso_week < ?2)
                 ORDER BY iso_year DESC, iso_week DESC
                 LIMIT 1",
                params![before.year(), before.week()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((week_key, payload)) => {
                debug!(%before, previous = %week_key, "Loaded previous state");
                Self::decode(&week_key, &payload).map(Some)
            }
            None => {
                debug!(%before, "No previous state");
                Ok(None)
            }
        }
    }

    fn load(&self, week: WeekKey) -> Result<Option<WeeklyState>, Self::Error> {
        let key = week.to_string();
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM weekly_states WHERE week_key = ?1",
                params![&key],
                |row| row.get(0),
            )
            .optional()?;

        payload.map(|p| Self::decode(&key, &p)).transpose()
    }

    fn save(&mut self, state: &WeeklyState) -> Result<(), Self::Error> {
        let payload = serde_json::to_string(state)?;
        let key = state.week_key.to_string();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO weekly_states (week_key, iso_year, iso_week, generated_at, company_count, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(week_key) DO UPDATE SET
             generated_at = excluded.generated_at,
             company_count = excluded.company_count,
             payload = excluded.payload",
            params![
                &key,
                state.week_key.year(),
                state.week_key.week(),
                state.generated_at.to_rfc3339(),
                state.snapshots.len() as i64,
                &payload,
            ],
        )?;
        tx.commit()?;

        debug!(week = %key, bytes = payload.len(), "Saved weekly state");
        Ok(())
    }

    fn list_weeks(&self) -> Result<Vec<WeekKey>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT week_key FROM weekly_states ORDER BY iso_year, iso_week")?;

        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        keys.into_iter()
            .map(|k| k.parse().map_err(StoreError::InvalidData))
            .collect()
    }
}

/// One of the store backends, chosen by configuration
pub enum AnyStateStore {
    /// SQLite database
    Sqlite(SqliteStateStore),
    /// Directory of JSON files
    File(FileStateStore),
}

impl AnyStateStore {
    /// Open the store selected by `config`
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        config.validate().map_err(StoreError::InvalidData)?;

        match config.backend {
            StoreBackend::Sqlite => {
                if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Ok(AnyStateStore::Sqlite(SqliteStateStore::new(&config.path)?))
            }
            StoreBackend::File => Ok(AnyStateStore::File(FileStateStore::new(&config.path)?)),
        }
    }
}

impl StateStore for AnyStateStore {
    type Error = StoreError;

    fn load_previous(&self, before: WeekKey) -> Result<Option<WeeklyState>, Self::Error> {
        match self {
            AnyStateStore::Sqlite(s) => s.load_previous(before),
            AnyStateStore::File(s) => s.load_previous(before),
        }
    }

    fn load(&self, week: WeekKey) -> Result<Option<WeeklyState>, Self::Error> {
        match self {
            AnyStateStore::Sqlite(s) => s.load(week),
            AnyStateStore::File(s) => s.load(week),
        }
    }

    fn save(&mut self, state: &WeeklyState) -> Result<(), Self::Error> {
        match self {
            AnyStateStore::Sqlite(s) => s.save(state),
            AnyStateStore::File(s) => s.save(state),
        }
    }

    fn list_weeks(&self) -> Result<Vec<WeekKey>, Self::Error> {
        match self {
            AnyStateStore::Sqlite(s) => s.list_weeks(),
            AnyStateStore::File(s) => s.list_weeks(),
        }
    }
}
