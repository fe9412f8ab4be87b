//! Domain models for the reshaping pipeline.
//!
//! - [`Record`] - one flat row of provider data
//! - [`Table`] - ordered records plus their union-of-keys column set
//! - [`PivotSpec`] - how to cross-tabulate a table
//! - [`Aggregation`] - how a pivot cell is computed from its group
//! - [`PivotTable`] - a built cross-tabulation (also used for change views)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{ReshapeError, ReshapeResult};

/// Sheet label used for a pivot view when the spec names none.
pub const DEFAULT_PIVOT_SHEET: &str = "TABLE_VIEW";

/// Sheet label used for a change view when the spec names none.
pub const DEFAULT_CHANGE_SHEET: &str = "CHANGE";

/// One flat row: column name -> scalar or null.
///
/// Key order is insertion order (`serde_json` is built with `preserve_order`).
pub type Record = Map<String, Value>;

static NULL: Value = Value::Null;

// =============================================================================
// Table
// =============================================================================

/// Rectangular view over a list of records.
///
/// The column set is the union of all record keys in first-seen order, so
/// every column appears in at least one record. A record lacking a column
/// reads as `null` for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    /// Build a table, deriving the column set from the records.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self::with_columns(Vec::new(), records)
    }

    /// Build a table whose columns start with `leading`, in that order.
    ///
    /// Record keys not in `leading` follow in first-seen order. The header
    /// survives even when there are no records.
    pub fn with_columns(leading: Vec<String>, records: Vec<Record>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for name in leading {
            if seen.insert(name.clone()) {
                columns.push(name);
            }
        }
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell value; `null` when the record lacks the column or the row is out of range.
    pub fn value(&self, row: usize, column: &str) -> &Value {
        self.records
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// Names from `wanted` that are not columns of this table, deduplicated, in order.
    pub fn missing_columns<'a, I>(&self, wanted: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut missing: Vec<String> = Vec::new();
        for name in wanted {
            if !self.has_column(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }
}

// =============================================================================
// Pivot Spec
// =============================================================================

/// Rule turning a group of numeric cells into one pivot cell.
///
/// Null cells (absent or non-numeric) are skipped by every rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// First non-null value in input order
    #[default]
    First,
    /// Last non-null value in input order
    Last,
    Sum,
    Mean,
    Min,
    Max,
    /// Number of non-null values
    Count,
}

impl Aggregation {
    /// Aggregate a group's values (input order).
    pub fn apply(&self, values: &[Option<f64>]) -> Option<f64> {
        let mut present = values.iter().flatten().copied();
        match self {
            Aggregation::First => present.next(),
            Aggregation::Last => present.last(),
            Aggregation::Sum => present.reduce(|a, b| a + b),
            Aggregation::Mean => {
                let (sum, n) = present.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                (n > 0).then(|| sum / n as f64)
            }
            Aggregation::Min => present.reduce(f64::min),
            Aggregation::Max => present.reduce(f64::max),
            Aggregation::Count => Some(present.count() as f64),
        }
    }
}

/// How to cross-tabulate a table.
///
/// Field aliases accept the spellings used by existing job files
/// (`values`, `sheetName`, `flatten_columns_year`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotSpec {
    /// Group-by columns (at least one)
    pub index: Vec<String>,

    /// Pivot-key columns; their value tuples become output columns
    #[serde(default)]
    pub columns: Vec<String>,

    /// Column aggregated into cells
    #[serde(default = "default_value_column", alias = "values")]
    pub value: String,

    #[serde(default, alias = "aggfunc")]
    pub aggregation: Aggregation,

    #[serde(default, alias = "sheetName")]
    pub sheet_name: Option<String>,

    /// Render `202511` style labels as `2025.11`
    #[serde(
        default,
        alias = "normalizePeriodLabels",
        alias = "flatten_columns_year"
    )]
    pub normalize_period_labels: bool,

    /// Also emit a period-over-period change view
    #[serde(default, alias = "change")]
    pub include_change: bool,

    #[serde(default)]
    pub change_sheet_name: Option<String>,
}

fn default_value_column() -> String {
    "DT".to_string()
}

impl PivotSpec {
    /// Spec with the given keys and every option at its default.
    pub fn new(index: Vec<String>, columns: Vec<String>, value: impl Into<String>) -> Self {
        Self {
            index,
            columns,
            value: value.into(),
            aggregation: Aggregation::default(),
            sheet_name: None,
            normalize_period_labels: false,
            include_change: false,
            change_sheet_name: None,
        }
    }

    /// Parse a spec from a job's raw `pivot` object.
    ///
    /// Shape problems (non-list `index`/`columns`, empty `index`, unknown
    /// aggregation) are reported as [`ReshapeError::InvalidSpec`].
    pub fn from_value(value: &Value) -> ReshapeResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ReshapeError::InvalidSpec("pivot must be an object".to_string()))?;

        for key in ["index", "columns"] {
            match obj.get(key) {
                Some(Value::Array(_)) => {}
                None if key == "columns" => {}
                None => {
                    return Err(ReshapeError::InvalidSpec(format!("pivot.{} is required", key)));
                }
                Some(_) => {
                    return Err(ReshapeError::InvalidSpec(format!("pivot.{} must be a list", key)));
                }
            }
        }

        let spec: PivotSpec = serde_json::from_value(value.clone())
            .map_err(|e| ReshapeError::InvalidSpec(e.to_string()))?;

        if spec.index.is_empty() {
            return Err(ReshapeError::InvalidSpec(
                "pivot.index must name at least one column".to_string(),
            ));
        }

        Ok(spec)
    }

    /// `index ∪ columns ∪ {value}` in declaration order, without repeats.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let all = self
            .index
            .iter()
            .chain(self.columns.iter())
            .chain(std::iter::once(&self.value));
        for name in all {
            if !out.contains(&name.as_str()) {
                out.push(name);
            }
        }
        out
    }

    pub fn pivot_sheet(&self) -> &str {
        self.sheet_name.as_deref().unwrap_or(DEFAULT_PIVOT_SHEET)
    }

    pub fn change_sheet(&self) -> &str {
        self.change_sheet_name.as_deref().unwrap_or(DEFAULT_CHANGE_SHEET)
    }
}

// =============================================================================
// Pivot Table
// =============================================================================

/// A built cross-tabulation.
///
/// Rows are sorted by their index key; `labels` are the flattened value
/// column labels in output order. Change views share this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    /// Index column names
    pub index: Vec<String>,
    /// Value column labels, left to right
    pub labels: Vec<String>,
    pub rows: Vec<PivotRow>,
}

/// One output row: its index key and one cell per label.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub key: Vec<Value>,
    pub cells: Vec<Option<f64>>,
}

impl PivotTable {
    /// Cell at `row` under `label`; `None` for an absent cell or unknown label.
    pub fn cell(&self, row: usize, label: &str) -> Option<f64> {
        let col = self.labels.iter().position(|l| l == label)?;
        self.rows.get(row)?.cells.get(col).copied().flatten()
    }

    /// Flatten into a plain table: index columns first, then one column per label.
    ///
    /// Absent cells are written as explicit `null`s. A pivot without rows
    /// still carries its full header.
    pub fn to_table(&self) -> Table {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let mut record = Record::new();
                for (name, key) in self.index.iter().zip(&row.key) {
                    record.insert(name.clone(), key.clone());
                }
                for (label, cell) in self.labels.iter().zip(&row.cells) {
                    record.insert(label.clone(), number_value(*cell));
                }
                record
            })
            .collect();
        let columns = self.index.iter().chain(&self.labels).cloned().collect();
        Table::with_columns(columns, records)
    }
}

fn number_value(cell: Option<f64>) -> Value {
    cell.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
