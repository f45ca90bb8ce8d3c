use std::collections::{HashMap, HashSet};

use chrono::Utc;
use indexmap::IndexMap;
use log::info;

use crate::error::{BenchStoreError, Result};
use crate::models::{Run, SeriesPoint, StoreData};

/// Suite key used by the chart page when none is configured.
pub const DEFAULT_SUITE: &str = "Benchmark";

/// Position of a run in the ingestion log.
pub type RunId = usize;

#[derive(Debug, Clone)]
struct StoredRun {
    suite: String,
    run: Run,
}

/// Append-only benchmark history with an inverted index from benchmark
/// name to the runs containing it.
#[derive(Debug)]
pub struct HistoryStore {
    last_update: i64,
    repo_url: String,
    // Ingestion order, oldest-first within each suite
    runs: Vec<StoredRun>,
    commit_ids: HashSet<String>,
    index: HashMap<String, Vec<RunId>>,
    // First-seen order of benchmark names
    name_order: Vec<String>,
}

impl HistoryStore {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            last_update: 0,
            repo_url: repo_url.into(),
            runs: Vec::new(),
            commit_ids: HashSet::new(),
            index: HashMap::new(),
            name_order: Vec::new(),
        }
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn set_repo_url(&mut self, repo_url: impl Into<String>) {
        self.repo_url = repo_url.into();
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Validate and append a run, updating the inverted index. All-or-nothing:
    /// a malformed measurement or duplicate commit rejects the whole run
    /// before any mutation.
    pub fn ingest(&mut self, suite: &str, run: Run, force: bool) -> Result<RunId> {
        validate_run(&run)?;

        if !force && self.commit_ids.contains(&run.commit.id) {
            return Err(BenchStoreError::DuplicateCommit(run.commit.id.clone()));
        }

        let run_id = self.runs.len();
        self.commit_ids.insert(run.commit.id.clone());

        for measurement in &run.benches {
            if !self.index.contains_key(&measurement.name) {
                self.name_order.push(measurement.name.clone());
            }
            let indices = self.index.entry(measurement.name.clone()).or_default();
            // A run with several same-named measurements is indexed once
            if indices.last() != Some(&run_id) {
                indices.push(run_id);
            }
        }

        info!(
            "Ingested run for commit {} ({} measurements) into suite {suite:?}",
            run.commit.id,
            run.benches.len()
        );

        self.runs.push(StoredRun {
            suite: suite.to_string(),
            run,
        });
        self.last_update = Utc::now().timestamp_millis();

        Ok(run_id)
    }

    /// Time series for one benchmark name: ascending by run date, ingestion
    /// order as tiebreak. Unobserved names yield an empty series.
    pub fn series(&self, name: &str) -> Vec<SeriesPoint> {
        let Some(indices) = self.index.get(name) else {
            return Vec::new();
        };

        let mut runs: Vec<&Run> = indices.iter().map(|&id| &self.runs[id].run).collect();
        // Indices are already in ingestion order, so a stable sort keeps
        // that order for equal dates
        runs.sort_by_key(|run| run.date);

        runs.iter()
            .flat_map(|run| {
                run.benches
                    .iter()
                    .filter(|m| m.name == name)
                    .map(|m| SeriesPoint {
                        date: run.date,
                        value: m.value,
                        range: m.range,
                        unit: m.unit.clone(),
                    })
            })
            .collect()
    }

    /// Most recently ingested run, by ingestion order rather than by date.
    pub fn latest(&self) -> Option<&Run> {
        self.runs.last().map(|stored| &stored.run)
    }

    /// All benchmark names ever observed, in first-seen order.
    pub fn names(&self) -> Vec<&str> {
        self.name_order.iter().map(String::as_str).collect()
    }

    /// Administrative escape hatch: drop every run recorded for a commit.
    /// Returns the number of runs removed.
    pub fn prune_commit(&mut self, commit_id: &str) -> usize {
        let before = self.runs.len();
        self.runs.retain(|stored| stored.run.commit.id != commit_id);
        let removed = before - self.runs.len();

        if removed > 0 {
            self.rebuild_index();
            self.last_update = Utc::now().timestamp_millis();
            info!("Pruned {removed} run(s) for commit {commit_id}");
        }

        removed
    }

    /// Administrative compaction: keep only the most recent `keep` runs of
    /// each suite, dropping the oldest. Returns the number of runs removed.
    pub fn keep_last(&mut self, keep: usize) -> usize {
        let mut per_suite: HashMap<&str, usize> = HashMap::new();
        for stored in &self.runs {
            *per_suite.entry(stored.suite.as_str()).or_insert(0) += 1;
        }

        let mut to_drop: HashMap<String, usize> = per_suite
            .into_iter()
            .map(|(suite, count)| (suite.to_string(), count.saturating_sub(keep)))
            .collect();

        let before = self.runs.len();
        self.runs.retain(|stored| {
            match to_drop.get_mut(stored.suite.as_str()) {
                Some(drop_left) if *drop_left > 0 => {
                    *drop_left -= 1;
                    false
                }
                _ => true,
            }
        });
        let removed = before - self.runs.len();

        if removed > 0 {
            self.rebuild_index();
            self.last_update = Utc::now().timestamp_millis();
            info!("Compacted history: removed {removed} oldest run(s)");
        }

        removed
    }

    /// Rebuild a store from its persisted layout. Suite arrays are taken
    /// oldest-first; the inverted index is reconstructed from scratch.
    pub fn from_data(data: StoreData) -> Self {
        let mut store = Self::new(data.repo_url);

        for (suite, runs) in data.entries {
            for run in runs {
                store.runs.push(StoredRun {
                    suite: suite.clone(),
                    run,
                });
            }
        }

        store.rebuild_index();
        store.last_update = data.last_update;
        store
    }

    /// Persisted layout: runs grouped by suite, oldest-first.
    pub fn to_data(&self) -> StoreData {
        let mut entries: IndexMap<String, Vec<Run>> = IndexMap::new();
        for stored in &self.runs {
            entries
                .entry(stored.suite.clone())
                .or_default()
                .push(stored.run.clone());
        }

        StoreData {
            last_update: self.last_update,
            repo_url: self.repo_url.clone(),
            entries,
        }
    }

    fn rebuild_index(&mut self) {
        self.commit_ids.clear();
        self.index.clear();
        self.name_order.clear();

        for (run_id, stored) in self.runs.iter().enumerate() {
            self.commit_ids.insert(stored.run.commit.id.clone());

            for measurement in &stored.run.benches {
                if !self.index.contains_key(&measurement.name) {
                    self.name_order.push(measurement.name.clone());
                }
                let indices = self.index.entry(measurement.name.clone()).or_default();
                if indices.last() != Some(&run_id) {
                    indices.push(run_id);
                }
            }
        }
    }
}

fn validate_run(run: &Run) -> Result<()> {
    if run.commit.id.is_empty() {
        return Err(BenchStoreError::MissingCommitId);
    }

    for (index, measurement) in run.benches.iter().enumerate() {
        let reason = if measurement.name.is_empty() {
            Some("empty name")
        } else if !measurement.value.is_finite() {
            Some("non-finite value")
        } else if !measurement.range.magnitude().is_finite() {
            Some("non-finite range")
        } else if measurement.range.magnitude() < 0.0 {
            Some("negative range")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(BenchStoreError::MalformedMeasurement {
                index,
                name: measurement.name.clone(),
                reason: reason.to_string(),
            });
        }
    }

    Ok(())
}
