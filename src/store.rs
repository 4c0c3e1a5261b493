// src/store.rs
//! Persistent record of matches that already triggered a notification,
//! tracked per source URL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One relevant announcement. Two matches are the same iff title and date are equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Match {
    // `part` is what older state files used for the title.
    #[serde(alias = "part")]
    pub title: String,
    pub date: String,
}

impl Match {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
        }
    }
}

/// Source URL -> matches already notified, in insertion order.
pub type MatchState = BTreeMap<String, Vec<Match>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("match store at {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("match store I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serializing match store: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            StoreError::Corrupt { .. } => 2,
            StoreError::Io { .. } | StoreError::Encode(_) => 1,
        }
    }
}

/// Read the state file. A missing file is an empty state; anything that is
/// not the expected JSON (including non-UTF-8 bytes) is `Corrupt`.
pub fn load(path: &Path) -> Result<MatchState, StoreError> {
    let data = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(MatchState::new()),
        Err(e) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_slice(&data).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Overwrite the state file with `state`.
pub fn save(path: &Path, state: &MatchState) -> Result<(), StoreError> {
    let io_err = |e: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let bytes = serde_json::to_vec_pretty(state)?;
    fs::write(path, bytes).map_err(io_err)
}

/// True iff `m` has not been recorded under `source` yet.
pub fn is_new(state: &MatchState, source: &str, m: &Match) -> bool {
    state.get(source).map_or(true, |seen| !seen.contains(m))
}

/// Append `m` under `source`. Does not check for duplicates; call `is_new` first.
pub fn record(state: &mut MatchState, source: &str, m: Match) {
    state.entry(source.to_string()).or_default().push(m);
}

/// The state file plus its in-memory contents for one run.
#[derive(Debug)]
pub struct MatchStore {
    path: PathBuf,
    state: MatchState,
}

impl MatchStore {
    /// Load from `path`. With `reset_on_corrupt`, an unparseable file is
    /// replaced by an empty state (logged) instead of failing.
    pub fn open(path: impl Into<PathBuf>, reset_on_corrupt: bool) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match load(&path) {
            Ok(s) => s,
            Err(e @ StoreError::Corrupt { .. }) if reset_on_corrupt => {
                tracing::warn!(error = %e, "resetting corrupt match store to empty");
                MatchState::new()
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(
            path = %path.display(),
            sources = state.len(),
            matches = state.values().map(Vec::len).sum::<usize>(),
            "match store loaded"
        );
        Ok(Self { path, state })
    }

    pub fn is_new(&self, source: &str, m: &Match) -> bool {
        is_new(&self.state, source, m)
    }

    pub fn record(&mut self, source: &str, m: Match) {
        record(&mut self.state, source, m)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        save(&self.path, &self.state)
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
