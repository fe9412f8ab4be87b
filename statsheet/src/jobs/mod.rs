//! Job descriptors and job discovery.
//!
//! A job is one JSON file: which provider to call, with which parameters,
//! how to pivot the result, and where to write it.
//!
//! ```json
//! {
//!   "job_name": "monthly population",
//!   "provider": "kosis",
//!   "orgId": "101", "tblId": "DT_1B040A3", "prdSe": "M", "newEstPrdCnt": 12,
//!   "output_prefix": "population", "output_subdir": "kosis",
//!   "pivot": {"index": ["C1_NM"], "columns": ["PRD_DE"], "values": "DT",
//!             "flatten_columns_year": true}
//! }
//! ```

pub mod runner;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::JobResult;

pub use runner::{export_items, run_all, run_job_file, BatchReport};

/// A parsed job file.
///
/// Provider-specific fields (`orgId`, `objL1`, ...) stay in [`JobSpec::fields`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default)]
    pub job_name: Option<String>,

    /// `kosis` (default) or `data_go_kr`
    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default)]
    pub output_prefix: Option<String>,

    #[serde(default)]
    pub output_subdir: Option<String>,

    /// Raw pivot object; parsed leniently so a bad spec never fails the job
    #[serde(default)]
    pub pivot: Option<Value>,

    /// data.go.kr endpoint
    #[serde(default)]
    pub base_url: Option<String>,

    /// data.go.kr query parameters
    #[serde(default)]
    pub params: Option<Value>,

    /// Dotted path to the item list inside a nested response
    #[serde(default)]
    pub item_path: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl JobSpec {
    /// Parse a job from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Provider field as a trimmed, non-empty string (numbers accepted).
    pub fn field_str(&self, key: &str) -> Option<String> {
        let text = match self.fields.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// `job_name`, else the job file's stem.
    pub fn display_name(&self, path: &Path) -> String {
        self.job_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "job".to_string())
    }
}

/// Read and parse one job file.
pub fn load_job(path: &Path) -> JobResult<JobSpec> {
    let content = fs::read_to_string(path)?;
    Ok(JobSpec::from_json(&content)?)
}

/// `*.json` files in `dir`, sorted by path. A missing directory has no jobs.
pub fn discover_jobs(dir: &Path) -> JobResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut jobs: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "json"))
        .collect();
    jobs.sort();
    Ok(jobs)
}
