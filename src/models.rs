use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub author: CommitIdentity,
    pub committer: CommitIdentity,
    pub distinct: bool,
    pub id: String,
    pub message: String,
    pub timestamp: DateTime<FixedOffset>,
    pub tree_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub commit: Commit,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub tool: String,
    pub benches: Vec<Measurement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub value: f64,
    pub range: Range,
    pub unit: String,
}

/// Uncertainty magnitude of a measurement, serialized in the chart page's
/// display convention: the string `"± <number>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range(pub f64);

impl Range {
    pub fn magnitude(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "± {}", self.0)
    }
}

impl Serialize for Range {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let magnitude = raw.trim_start_matches('±').trim();
        magnitude
            .parse::<f64>()
            .map(Range)
            .map_err(|_| D::Error::custom(format!("invalid range string: {raw:?}")))
    }
}

/// One point of a benchmark's time series, as returned by `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub value: f64,
    pub range: Range,
    pub unit: String,
}

/// Top-level persisted layout, matching the chart page's
/// `window.BENCHMARK_DATA` object. Suite arrays are kept oldest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreData {
    pub last_update: i64,
    pub repo_url: String,
    pub entries: IndexMap<String, Vec<Run>>,
}
