//! Cross-tabulation of a [`Table`] into a [`PivotTable`].
//!
//! # Algorithm
//!
//! ```text
//! records ──▶ group by index tuple ──▶ sub-group by columns tuple ──▶ aggregate value
//!                    │                          │
//!             rows, sorted by key       column universe, sorted,
//!                                       flattened with "_"
//! ```
//!
//! Value cells are coerced to numbers (unparseable -> null). Column keys are
//! compared by their string form, so `202501` and `"202501"` land in the same
//! column. Records whose index or column key is null take no part in the
//! pivot. Period label formatting happens after grouping and sorting and
//! never changes either.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::{ReshapeError, ReshapeResult};
use crate::export::disambiguate;
use crate::models::{PivotRow, PivotSpec, PivotTable, Table};

/// Region/category name column of statistics feeds.
pub const GROUP_COLUMN: &str = "C1_NM";

/// Region/category code column, used when [`GROUP_COLUMN`] is absent.
pub const FALLBACK_GROUP_COLUMN: &str = "C1";

/// Period column (`2023`, `202511`, ...).
pub const PERIOD_COLUMN: &str = "PRD_DE";

/// Numeric value column.
pub const VALUE_COLUMN: &str = "DT";

/// Separator between parts of a multi-column label.
pub const LABEL_SEPARATOR: &str = "_";

static PERIOD_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})([0-9]{2,})$").expect("period label pattern is valid")
});

// =============================================================================
// Group keys
// =============================================================================

/// One component of an index key.
///
/// Ordering: booleans, then numbers (numerically), then text (by code point).
/// Equality follows the ordering, so `1` and `1.0` are the same key.
#[derive(Debug, Clone)]
enum KeyPart {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl KeyPart {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(KeyPart::Bool(*b)),
            Value::Number(n) => Some(KeyPart::Number(n.clone())),
            Value::String(s) => Some(KeyPart::Text(s.clone())),
            nested => Some(KeyPart::Text(nested.to_string())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyPart::Bool(_) => 0,
            KeyPart::Number(_) => 1,
            KeyPart::Text(_) => 2,
        }
    }

    fn into_value(self) -> Value {
        match self {
            KeyPart::Bool(b) => Value::Bool(b),
            KeyPart::Number(n) => Value::Number(n),
            KeyPart::Text(s) => Value::String(s),
        }
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Bool(a), KeyPart::Bool(b)) => a.cmp(b),
            (KeyPart::Number(a), KeyPart::Number(b)) => as_f64(a).total_cmp(&as_f64(b)),
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

fn as_f64(n: &Number) -> f64 {
    n.as_f64().unwrap_or(f64::NAN)
}

// =============================================================================
// Cell coercion
// =============================================================================

/// Numeric form of a value cell; anything unparseable is `None`.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// String form of a column key; `None` for null.
pub fn key_label(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Join a column-key tuple into one label.
///
/// An empty tuple (no pivot columns) is labeled by the value column.
pub fn flatten_label(parts: &[String], value_column: &str) -> String {
    if parts.is_empty() {
        value_column.to_string()
    } else {
        parts.join(LABEL_SEPARATOR)
    }
}

/// `202511` -> `2025.11`; labels that are not 6+ ASCII digits are unchanged.
pub fn normalize_period_label(label: &str) -> String {
    PERIOD_LABEL.replace(label, "$1.$2").into_owned()
}

// =============================================================================
// Pivot building
// =============================================================================

type Cells = BTreeMap<Vec<String>, Vec<Option<f64>>>;

/// Build a cross-tabulation of `table` according to `spec`.
///
/// Fails with [`ReshapeError::MissingColumns`] when the spec names columns
/// the table lacks, and [`ReshapeError::InvalidSpec`] on an empty index.
/// Bad value cells never fail the pivot; they aggregate as nulls.
pub fn build_pivot(table: &Table, spec: &PivotSpec) -> ReshapeResult<PivotTable> {
    if spec.index.is_empty() {
        return Err(ReshapeError::InvalidSpec(
            "pivot.index must name at least one column".to_string(),
        ));
    }

    let missing = table.missing_columns(spec.required_columns());
    if !missing.is_empty() {
        return Err(ReshapeError::MissingColumns(missing));
    }

    let mut groups: BTreeMap<Vec<KeyPart>, Cells> = BTreeMap::new();
    let mut universe: BTreeSet<Vec<String>> = BTreeSet::new();

    'records: for record in table.records() {
        let mut key = Vec::with_capacity(spec.index.len());
        for name in &spec.index {
            match record.get(name).and_then(KeyPart::from_value) {
                Some(part) => key.push(part),
                None => continue 'records,
            }
        }

        let mut column_key = Vec::with_capacity(spec.columns.len());
        for name in &spec.columns {
            match record.get(name).and_then(key_label) {
                Some(label) => column_key.push(label),
                None => continue 'records,
            }
        }

        let cell = record.get(&spec.value).and_then(to_number);
        universe.insert(column_key.clone());
        groups
            .entry(key)
            .or_default()
            .entry(column_key)
            .or_default()
            .push(cell);
    }

    let column_keys: Vec<Vec<String>> = universe.into_iter().collect();
    let labels = unique_labels(
        column_keys.iter().map(|parts| {
            let label = flatten_label(parts, &spec.value);
            if spec.normalize_period_labels {
                normalize_period_label(&label)
            } else {
                label
            }
        }),
        &spec.index,
    );

    let rows = groups
        .into_iter()
        .map(|(key, cells)| PivotRow {
            key: key.into_iter().map(KeyPart::into_value).collect(),
            cells: column_keys
                .iter()
                .map(|ck| cells.get(ck).and_then(|vals| spec.aggregation.apply(vals)))
                .collect(),
        })
        .collect();

    Ok(PivotTable {
        index: spec.index.clone(),
        labels,
        rows,
    })
}

/// Make value labels distinct from each other and from the index columns.
///
/// A repeat (two keys formatting alike, or a key named like an index
/// column) gets a `~2`, `~3`, ... suffix, so no cell is shadowed.
fn unique_labels<I>(labels: I, index: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut used: HashSet<String> = index.iter().cloned().collect();
    let mut out = Vec::new();
    for label in labels {
        let label = disambiguate(&label, usize::MAX, |candidate| used.contains(candidate));
        used.insert(label.clone());
        out.push(label);
    }
    out
}

/// The zero-configuration spec: group x period over the value column.
///
/// `None` when the table lacks the value, period, or any group column.
pub fn default_pivot_spec(table: &Table) -> Option<PivotSpec> {
    if !table.has_column(VALUE_COLUMN) || !table.has_column(PERIOD_COLUMN) {
        return None;
    }

    let group = [GROUP_COLUMN, FALLBACK_GROUP_COLUMN]
        .into_iter()
        .find(|c| table.has_column(c))?;

    let mut spec = PivotSpec::new(
        vec![group.to_string()],
        vec![PERIOD_COLUMN.to_string()],
        VALUE_COLUMN,
    );
    spec.normalize_period_labels = true;
    spec.include_change = true;
    Some(spec)
}

/// Pivot with [`default_pivot_spec`]; `None` when no pivot is producible.
pub fn build_default_pivot(table: &Table) -> Option<PivotTable> {
    let spec = default_pivot_spec(table)?;
    build_pivot(table, &spec).ok()
}
