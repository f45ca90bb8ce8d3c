use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::{BenchStoreError, Result};
use crate::models::StoreData;
use crate::store::HistoryStore;

// Prefix used by the chart page, which loads the store as a script tag
const JS_PREFIX: &str = "window.BENCHMARK_DATA = ";

/// Load a store from disk. A missing file yields a fresh empty store; an
/// unparseable one is fatal, never partially loaded.
pub fn load_or_default(path: &Path) -> Result<HistoryStore> {
    if !path.exists() {
        warn!("Store file {} not found, starting empty", path.display());
        return Ok(HistoryStore::new(""));
    }

    let content = fs::read_to_string(path)?;
    let data = parse(&content).map_err(|err| BenchStoreError::CorruptStore {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    let store = HistoryStore::from_data(data);
    info!("Loaded {} run(s) from {}", store.len(), path.display());

    Ok(store)
}

/// Write the store to disk: the chart page's `window.BENCHMARK_DATA = ...`
/// form for `.js` paths, raw JSON otherwise.
pub fn save(store: &HistoryStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&store.to_data())?;
    let content = if path.extension().is_some_and(|ext| ext == "js") {
        format!("{JS_PREFIX}{json}\n")
    } else {
        format!("{json}\n")
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    info!("Wrote {} run(s) to {}", store.len(), path.display());

    Ok(())
}

fn parse(content: &str) -> serde_json::Result<StoreData> {
    let trimmed = content.trim_start();
    let json = match trimmed.strip_prefix("window.BENCHMARK_DATA") {
        Some(rest) => rest
            .trim_start()
            .trim_start_matches('=')
            .trim_end()
            .trim_end_matches(';'),
        None => trimmed,
    };

    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::models::{Commit, CommitIdentity, Measurement, Range, Run};
    use crate::store::DEFAULT_SUITE;

    fn identity() -> CommitIdentity {
        CommitIdentity {
            email: "contact@bux.fr".to_string(),
            name: "Bastien Sevajol".to_string(),
            username: Some("buxx".to_string()),
        }
    }

    fn run(commit_id: &str, date_ms: i64) -> Run {
        Run {
            commit: Commit {
                author: identity(),
                committer: identity(),
                distinct: true,
                id: commit_id.to_string(),
                message: format!("commit {commit_id}"),
                timestamp: DateTime::parse_from_rfc3339("2025-01-09T23:04:06+01:00").unwrap(),
                tree_id: "tree".to_string(),
                url: format!("https://github.com/buxx/civ/commit/{commit_id}"),
            },
            date: Utc.timestamp_millis_opt(date_ms).unwrap(),
            tool: "cargo".to_string(),
            benches: vec![Measurement {
                name: "fibonacci 1M".to_string(),
                value: 309119.0,
                range: Range(333.0),
                unit: "ns/iter".to_string(),
            }],
        }
    }

    fn populated_store() -> HistoryStore {
        let mut store = HistoryStore::new("https://github.com/buxx/civ");
        store.ingest(DEFAULT_SUITE, run("c1", 1_000), false).unwrap();
        store.ingest(DEFAULT_SUITE, run("c2", 2_000), false).unwrap();
        store
    }

    #[test]
    fn test_roundtrip_through_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = populated_store();

        save(&store, &path).unwrap();
        let reloaded = load_or_default(&path).unwrap();

        assert_eq!(reloaded.names(), store.names());
        for name in store.names() {
            assert_eq!(reloaded.series(name), store.series(name));
        }
        assert_eq!(reloaded.repo_url(), store.repo_url());
    }

    #[test]
    fn test_js_path_writes_window_assignment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.js");

        save(&populated_store(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert!(content.starts_with("window.BENCHMARK_DATA = {"));
    }

    #[test]
    fn test_json_path_writes_raw_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        save(&populated_store(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert!(content.starts_with('{'));
    }

    #[test]
    fn test_roundtrip_through_js_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.js");
        let store = populated_store();

        save(&store, &path).unwrap();
        let reloaded = load_or_default(&path).unwrap();

        assert_eq!(reloaded.names(), store.names());
        for name in store.names() {
            assert_eq!(reloaded.series(name), store.series(name));
        }
    }

    #[test]
    fn test_load_tolerates_trailing_semicolon() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.js");
        let json = serde_json::to_string(&populated_store().to_data()).unwrap();
        fs::write(&path, format!("window.BENCHMARK_DATA = {json};\n")).unwrap();

        let reloaded = load_or_default(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.js");

        let store = load_or_default(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.js");
        fs::write(&path, "window.BENCHMARK_DATA = {\"lastUpdate\": oops").unwrap();

        let result = load_or_default(&path);
        assert!(matches!(result, Err(BenchStoreError::CorruptStore { .. })));
    }

    #[test]
    fn test_truncated_file_is_fatal_not_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.js");
        let store = populated_store();
        save(&store, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, &content[..content.len() / 2]).unwrap();

        assert!(load_or_default(&path).is_err());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dev").join("bench").join("data.js");

        save(&populated_store(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_accepts_artifact_shaped_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.js");
        fs::write(
            &path,
            r#"window.BENCHMARK_DATA = {
  "lastUpdate": 1736461525338,
  "repoUrl": "https://github.com/buxx/civ",
  "entries": {
    "Benchmark": [
      {
        "commit": {
          "author": {
            "email": "contact@bux.fr",
            "name": "Bastien Sevajol",
            "username": "buxx"
          },
          "committer": {
            "email": "contact@bux.fr",
            "name": "Bastien Sevajol",
            "username": "buxx"
          },
          "distinct": true,
          "id": "2da8d0252d773c264484c2860a0a75858c686d49",
          "message": "ci: push charts page of benchmarks fix",
          "timestamp": "2025-01-09T23:04:06+01:00",
          "tree_id": "ad4332b5d4b0e3ab160ecc80afb06e2bfa8da970",
          "url": "https://github.com/buxx/civ/commit/2da8d0252d773c264484c2860a0a75858c686d49"
        },
        "date": 1736460620620,
        "tool": "cargo",
        "benches": [
          {
            "name": "fibonacci 1M",
            "value": 309119,
            "range": "± 333",
            "unit": "ns/iter"
          }
        ]
      }
    ]
  }
}
"#,
        )
        .unwrap();

        let store = load_or_default(&path).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.names(), vec!["fibonacci 1M"]);
        assert_eq!(store.last_update(), 1736461525338);
        let series = store.series("fibonacci 1M");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 309119.0);
        assert_eq!(series[0].range.magnitude(), 333.0);
    }
}
