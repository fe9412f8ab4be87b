//! Period-over-period change view.

use crate::models::{PivotRow, PivotTable};

/// Successive differences across a pivot's value columns, left to right.
///
/// The result has the pivot's shape: same index keys, same labels. The
/// first column has no predecessor and is always `None`; a `None` operand
/// yields `None`, never a fabricated zero.
pub fn derive_change(pivot: &PivotTable) -> PivotTable {
    let rows = pivot
        .rows
        .iter()
        .map(|row| PivotRow {
            key: row.key.clone(),
            cells: diff_cells(&row.cells),
        })
        .collect();

    PivotTable {
        index: pivot.index.clone(),
        labels: pivot.labels.clone(),
        rows,
    }
}

fn diff_cells(cells: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(cells.len());
    if cells.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(cells.windows(2).map(|pair| match (pair[0], pair[1]) {
        (Some(previous), Some(current)) => Some(current - previous),
        _ => None,
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pivot(cells: Vec<Vec<Option<f64>>>) -> PivotTable {
        PivotTable {
            index: vec!["C1_NM".into()],
            labels: vec!["a".into(), "b".into(), "c".into()],
            rows: cells
                .into_iter()
                .enumerate()
                .map(|(i, cells)| PivotRow {
                    key: vec![json!(format!("r{}", i))],
                    cells,
                })
                .collect(),
        }
    }

    #[test]
    fn test_successive_differences() {
        let change = derive_change(&pivot(vec![vec![Some(1.0), Some(4.0), Some(2.5)]]));
        assert_eq!(change.rows[0].cells, vec![None, Some(3.0), Some(-1.5)]);
    }

    #[test]
    fn test_null_propagates() {
        let change = derive_change(&pivot(vec![
            vec![Some(1.0), None, Some(5.0)],
            vec![None, Some(2.0), Some(2.0)],
        ]));
        assert_eq!(change.rows[0].cells, vec![None, None, None]);
        assert_eq!(change.rows[1].cells, vec![None, None, Some(0.0)]);
    }

    #[test]
    fn test_shape_preserved() {
        let source = pivot(vec![vec![Some(1.0), Some(2.0), Some(3.0)]]);
        let change = derive_change(&source);
        assert_eq!(change.index, source.index);
        assert_eq!(change.labels, source.labels);
        assert_eq!(change.rows[0].key, source.rows[0].key);
    }

    #[test]
    fn test_single_and_empty_rows() {
        assert_eq!(diff_cells(&[Some(7.0)]), vec![None]);
        assert!(diff_cells(&[]).is_empty());
    }
}
