//! Reshaping pipeline: provider items → RAW table → pivot/change views → bundle.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use statsheet::transform::reshape;
//!
//! let items = vec![
//!     json!({"C1_NM": "Seoul", "PRD_DE": "202501", "DT": "10"}),
//!     json!({"C1_NM": "Busan", "PRD_DE": "202501", "DT": "5"}),
//! ];
//! let bundle = reshape(items, None)?;
//! assert_eq!(bundle.names(), vec!["RAW", "TABLE_VIEW", "CHANGE"]);
//! ```
//!
//! Only an empty item list fails the pipeline. A pivot that cannot be
//! built is logged and its sheets are left out; RAW is always exported.

use serde_json::Value;

use super::change::derive_change;
use super::normalize::to_table;
use super::pivot::{build_pivot, default_pivot_spec};
use crate::error::ReshapeResult;
use crate::export::{assemble, ExportBundle};
use crate::extract::{extract_items, normalize_to_list};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{PivotSpec, PivotTable, Table};

/// A built pivot, its optional change view, and their sheet labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub pivot_sheet: String,
    pub pivot: PivotTable,
    pub change_sheet: String,
    pub change: Option<PivotTable>,
}

impl TableView {
    /// Labeled tables for the export assembler, pivot first.
    pub fn into_views(self) -> Vec<(String, Option<Table>)> {
        vec![
            (self.pivot_sheet, Some(self.pivot.to_table())),
            (self.change_sheet, self.change.map(|c| c.to_table())),
        ]
    }
}

/// Pick the spec for a job: its own `pivot` object, else the default one.
///
/// `Ok(None)` means no pivot applies (default columns absent). An empty
/// `pivot` object counts as absent.
pub fn resolve_spec(table: &Table, pivot_cfg: Option<&Value>) -> ReshapeResult<Option<PivotSpec>> {
    match pivot_cfg {
        Some(Value::Object(obj)) if obj.is_empty() => Ok(default_pivot_spec(table)),
        Some(Value::Null) | None => Ok(default_pivot_spec(table)),
        Some(cfg) => PivotSpec::from_value(cfg).map(Some),
    }
}

/// Build the pivot (and change view, if asked for) for `table`.
pub fn build_table_view(table: &Table, pivot_cfg: Option<&Value>) -> ReshapeResult<Option<TableView>> {
    let Some(spec) = resolve_spec(table, pivot_cfg)? else {
        return Ok(None);
    };

    let pivot = build_pivot(table, &spec)?;
    let change = spec.include_change.then(|| derive_change(&pivot));

    Ok(Some(TableView {
        pivot_sheet: spec.pivot_sheet().to_string(),
        change_sheet: spec.change_sheet().to_string(),
        pivot,
        change,
    }))
}

/// Reshape extracted items into an export bundle.
///
/// Fails only with [`crate::error::ReshapeError::EmptyInput`].
pub fn reshape(items: Vec<Value>, pivot_cfg: Option<&Value>) -> ReshapeResult<ExportBundle> {
    let table = to_table(items)?;
    log_success(format!(
        "RAW: {} rows, {} columns",
        table.len(),
        table.columns().len()
    ));

    let views = match build_table_view(&table, pivot_cfg) {
        Ok(Some(view)) => {
            log_success(format!(
                "{}: {} rows x {} columns",
                view.pivot_sheet,
                view.pivot.rows.len(),
                view.pivot.labels.len()
            ));
            view.into_views()
        }
        Ok(None) => {
            log_info("No pivot columns found, exporting RAW only");
            Vec::new()
        }
        Err(e) => {
            log_warning(format!("Table view unavailable: {}", e));
            Vec::new()
        }
    };

    Ok(assemble(table, views))
}

/// Reshape a whole response document.
///
/// With `item_path`, items are taken from that path (a lone object counts as
/// one item); without it, the document itself is the item list.
pub fn reshape_document(
    doc: &Value,
    item_path: Option<&str>,
    pivot_cfg: Option<&Value>,
) -> ReshapeResult<ExportBundle> {
    let items = match item_path {
        Some(path) => extract_items(doc, path),
        None => normalize_to_list(doc.clone()),
    };
    reshape(items, pivot_cfg)
}
