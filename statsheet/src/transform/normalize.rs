//! Turn a provider's item list into a [`Table`].

use serde_json::Value;

use crate::error::{ReshapeError, ReshapeResult};
use crate::models::{Record, Table};

/// Column used when items are not objects.
pub const SCALAR_COLUMN: &str = "value";

/// Build a table from extracted items.
///
/// Objects become records as-is. If any item is not an object, every item
/// is wrapped as `{"value": item}` instead, keeping order. An empty list is
/// an error: zero rows almost always means a bad filter upstream.
pub fn to_table(items: Vec<Value>) -> ReshapeResult<Table> {
    if items.is_empty() {
        return Err(ReshapeError::EmptyInput);
    }

    let all_objects = items.iter().all(Value::is_object);
    let records: Vec<Record> = items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) if all_objects => map,
            other => {
                let mut record = Record::new();
                record.insert(SCALAR_COLUMN.to_string(), other);
                record
            }
        })
        .collect();

    Ok(Table::from_records(records))
}
