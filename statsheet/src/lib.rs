//! # Statsheet - statistical API responses to Excel workbooks
//!
//! Statsheet runs declarative JSON jobs against public statistics APIs
//! (KOSIS, data.go.kr), flattens the returned records, pivots them into a
//! period-by-group table, and writes everything to a dated `.xlsx` file.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Job JSON   │────▶│  Provider   │────▶│  Transform  │────▶│    XLSX     │
//! │ jobs/*.json │     │ HTTP, retry │     │ RAW, pivot  │     │ RAW + views │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serde_json::json;
//! use statsheet::{reshape, write_workbook};
//!
//! let items = vec![
//!     json!({"C1_NM": "Seoul", "PRD_DE": "202501", "DT": "10"}),
//!     json!({"C1_NM": "Seoul", "PRD_DE": "202502", "DT": "12"}),
//! ];
//! let bundle = reshape(items, None)?;
//! write_workbook(&bundle, "output/population.xlsx".as_ref())?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Table, pivot spec and pivot table
//! - [`extract`] - Dotted-path lookup in nested responses
//! - [`transform`] - Normalize, pivot, change, pipeline
//! - [`export`] - Sheet assembly and workbook writing
//! - [`providers`] - KOSIS and data.go.kr clients
//! - [`jobs`] - Job files and the batch runner
//! - [`config`] - Environment settings
//! - [`logs`] - Leveled, broadcast pipeline logs

// Core modules
pub mod error;
pub mod models;

// Reshaping
pub mod extract;
pub mod transform;

// Output
pub mod export;

// Fetching
pub mod providers;

// Jobs
pub mod config;
pub mod jobs;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExportError, ExportResult, FetchError, FetchResult, JobError, JobResult, ReshapeError,
    ReshapeResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Aggregation, PivotRow, PivotSpec, PivotTable, Record, Table};

// =============================================================================
// Re-exports - Reshaping
// =============================================================================

pub use extract::{extract_items, normalize_to_list, resolve};

pub use transform::{
    build_default_pivot, build_pivot, build_table_view, derive_change, normalize_period_label,
    reshape, reshape_document, to_table, TableView,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{assemble, output_path, sanitize_filename, write_workbook, ExportBundle, Sheet};

// =============================================================================
// Re-exports - Providers and jobs
// =============================================================================

pub use config::Settings;
pub use jobs::{discover_jobs, load_job, run_all, run_job_file, BatchReport, JobSpec};
pub use providers::{HttpFetcher, Provider};
