//! Workbook writing and output file naming.

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::ExportBundle;
use crate::error::ExportResult;
use crate::models::Table;

/// Characters not allowed in file names on common platforms.
const INVALID_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const MAX_PREFIX_LEN: usize = 150;

const DEFAULT_PREFIX: &str = "export";

/// Write every sheet of `bundle` to an xlsx file at `path`.
///
/// Row 0 holds the column names in bold. Nulls are left blank.
pub fn write_workbook(bundle: &ExportBundle, path: &Path) -> ExportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for sheet in bundle.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_table(worksheet, &sheet.table, &header)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, table: &Table, header: &Format) -> ExportResult<()> {
    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col_index(col), name, header)?;
    }

    for (row, record) in table.records().iter().enumerate() {
        let row = row_index(row + 1);
        for (col, name) in table.columns().iter().enumerate() {
            let col = col_index(col);
            match record.get(name) {
                None | Some(Value::Null) => {}
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(f) => {
                        worksheet.write_number(row, col, f)?;
                    }
                    None => {
                        worksheet.write_string(row, col, n.to_string())?;
                    }
                },
                Some(Value::String(s)) => {
                    worksheet.write_string(row, col, s)?;
                }
                Some(Value::Bool(b)) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Some(nested) => {
                    worksheet.write_string(row, col, nested.to_string())?;
                }
            }
        }
    }

    Ok(())
}

// Out-of-range positions saturate; the writer then rejects them.
fn row_index(row: usize) -> u32 {
    u32::try_from(row).unwrap_or(u32::MAX)
}

fn col_index(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}

/// Replace characters that are invalid in file names, trim, cap the length.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    replaced.trim().chars().take(MAX_PREFIX_LEN).collect()
}

/// `root[/subdir]/<prefix>_<YYYYMMDD>.xlsx`
pub fn output_path(
    root: &Path,
    subdir: Option<&str>,
    prefix: Option<&str>,
    date: NaiveDate,
) -> PathBuf {
    let dir = match subdir.map(str::trim).filter(|s| !s.is_empty()) {
        Some(sub) => root.join(sub),
        None => root.to_path_buf(),
    };

    let mut prefix = sanitize_filename(prefix.unwrap_or(DEFAULT_PREFIX));
    if prefix.is_empty() {
        prefix = DEFAULT_PREFIX.to_string();
    }

    dir.join(format!("{}_{}.xlsx", prefix, date.format("%Y%m%d")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::assemble;
    use serde_json::json;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    #[test]
    fn test_output_path_with_subdir() {
        let path = output_path(Path::new("output"), Some("kosis"), Some("population"), date());
        assert_eq!(path, PathBuf::from("output/kosis/population_20251103.xlsx"));
    }

    #[test]
    fn test_output_path_defaults() {
        let path = output_path(Path::new("output"), Some(""), None, date());
        assert_eq!(path, PathBuf::from("output/export_20251103.xlsx"));

        let path = output_path(Path::new("output"), None, Some(" ?? "), date());
        assert_eq!(path, PathBuf::from("output/___20251103.xlsx"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(" a/b:c*d "), "a_b_c_d");
        assert_eq!(sanitize_filename(&"x".repeat(200)).len(), 150);
        assert_eq!(sanitize_filename("월별 인구"), "월별 인구");
    }

    #[test]
    fn test_write_workbook_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.xlsx");

        let raw = Table::from_records(vec![
            json!({"C1_NM": "Seoul", "DT": "10", "ok": true, "n": null, "x": 1.5})
                .as_object()
                .unwrap()
                .clone(),
            json!({"C1_NM": "Busan", "extra": {"a": [1]}})
                .as_object()
                .unwrap()
                .clone(),
        ]);
        let bundle = assemble(raw.clone(), vec![("VIEW".into(), Some(raw))]);

        write_workbook(&bundle, &path).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn test_write_workbook_with_quoted_view_label() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quoted.xlsx");

        let raw = Table::from_records(vec![json!({"DT": "1"}).as_object().unwrap().clone()]);
        let bundle = assemble(raw.clone(), vec![("'Monthly'".into(), Some(raw))]);
        assert_eq!(bundle.names(), vec!["RAW", "Monthly"]);

        write_workbook(&bundle, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_workbook_header_only_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty_view.xlsx");

        let raw = Table::from_records(vec![json!({"DT": "1"}).as_object().unwrap().clone()]);
        let view = Table::with_columns(vec!["C1_NM".into(), "2025.01".into()], Vec::new());
        let bundle = assemble(raw, vec![("TABLE_VIEW".into(), Some(view))]);

        write_workbook(&bundle, &path).unwrap();
        assert!(path.exists());
    }
}
