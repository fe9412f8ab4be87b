//! Runtime settings.
//!
//! Read once at startup from the environment (a `.env` file is loaded
//! first if present), then handed down explicitly. Nothing below the
//! job runner reads the environment itself.

use std::env;
use std::path::PathBuf;

const DEFAULT_JOBS_DIR: &str = "jobs";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Where jobs live, where output goes, and provider credentials.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory scanned for `*.json` job files
    pub jobs_dir: PathBuf,
    /// Root directory for exported workbooks
    pub output_root: PathBuf,
    /// KOSIS open API key
    pub kosis_api_key: Option<String>,
    /// data.go.kr service key, substituted for `{{DATA_GO_KR_SERVICE_KEY}}`
    pub data_go_kr_service_key: Option<String>,
    /// Per-request HTTP timeout
    pub timeout_secs: u64,
    /// Attempts per request
    pub max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jobs_dir: PathBuf::from(DEFAULT_JOBS_DIR),
            output_root: PathBuf::from(DEFAULT_OUTPUT_DIR),
            kosis_api_key: None,
            data_go_kr_service_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        Self {
            jobs_dir: get("STATSHEET_JOBS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_dir),
            output_root: get("STATSHEET_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            kosis_api_key: get("KOSIS_API_KEY"),
            data_go_kr_service_key: get("DATA_GO_KR_SERVICE_KEY"),
            timeout_secs: get("STATSHEET_HTTP_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            max_retries: get("STATSHEET_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_retries),
        }
    }

    pub fn with_jobs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.jobs_dir = dir.into();
        self
    }

    pub fn with_output_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_root = dir.into();
        self
    }
}
