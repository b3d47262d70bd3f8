//! JSON-file implementation of StateStore

use crate::StoreError;
use sentinel_domain::traits::StateStore;
use sentinel_domain::{WeekKey, WeeklyState};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const EXTENSION: &str = "json";

/// Stores each week as `<dir>/<week_key>.json`
///
/// Writes go to a temporary file in the same directory which is then
/// atomically renamed over the target, so a crash never leaves a partially
/// written week behind.
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Open (or create) a store rooted at `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the state files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, week: WeekKey) -> PathBuf {
        self.dir.join(format!("{}.{}", week, EXTENSION))
    }

    fn read(&self, week: WeekKey) -> Result<Option<WeeklyState>, StoreError> {
        let path = self.path_for(week);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let state: WeeklyState = serde_json::from_str(&contents)?;
        if state.week_key != week {
            return Err(StoreError::InvalidData(format!(
                "{} holds state for {}",
                path.display(),
                state.week_key
            )));
        }
        Ok(Some(state))
    }
}

impl StateStore for FileStateStore {
    type Error = StoreError;

    fn load_previous(&self, before: WeekKey) -> Result<Option<WeeklyState>, Self::Error> {
        let previous = self.list_weeks()?.into_iter().filter(|w| *w < before).max();
        match previous {
            Some(week) => self.read(week),
            None => Ok(None),
        }
    }

    fn load(&self, week: WeekKey) -> Result<Option<WeeklyState>, Self::Error> {
        self.read(week)
    }

    fn save(&mut self, state: &WeeklyState) -> Result<(), Self::Error> {
        let target = self.path_for(state.week_key);
        let tmp = NamedTempFile::new_in(&self.dir)?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, state)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %target.display(), "Saved weekly state");
        Ok(())
    }

    fn list_weeks(&self) -> Result<Vec<WeekKey>, Self::Error> {
        let mut weeks = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<WeekKey>() {
                Ok(week) => weeks.push(week),
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unrecognised state file"),
            }
        }
        weeks.sort();
        Ok(weeks)
    }
}
