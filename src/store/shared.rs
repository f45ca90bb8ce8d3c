use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::models::{Run, SeriesPoint};
use crate::store::{HistoryStore, RunId};

/// Thread-safe handle over a single store: `ingest` and the prune
/// operations take the write lock, queries take the read lock and may run
/// concurrently with each other.
#[derive(Debug, Clone)]
pub struct SharedHistory {
    inner: Arc<RwLock<HistoryStore>>,
}

impl SharedHistory {
    pub fn new(store: HistoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn ingest(&self, suite: &str, run: Run, force: bool) -> Result<RunId> {
        self.inner
            .write()
            .expect("Failed to acquire history write lock")
            .ingest(suite, run, force)
    }

    pub fn series(&self, name: &str) -> Vec<SeriesPoint> {
        self.inner
            .read()
            .expect("Failed to acquire history read lock")
            .series(name)
    }

    pub fn latest(&self) -> Option<Run> {
        self.inner
            .read()
            .expect("Failed to acquire history read lock")
            .latest()
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .expect("Failed to acquire history read lock")
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn prune_commit(&self, commit_id: &str) -> usize {
        self.inner
            .write()
            .expect("Failed to acquire history write lock")
            .prune_commit(commit_id)
    }

    pub fn keep_last(&self, keep: usize) -> usize {
        self.inner
            .write()
            .expect("Failed to acquire history write lock")
            .keep_last(keep)
    }
}
