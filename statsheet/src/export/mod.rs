//! Export assembly: raw table plus derived views as named sheets.
//!
//! The assembler only sequences and names; it never touches cell data.
//! Naming rules (spreadsheet sheet-name limits):
//!
//! - characters `[ ] : * ? / \` are replaced with `_`
//! - an empty label becomes `VIEW`
//! - labels are cut to 31 characters
//! - a label equal (case-insensitively) to an earlier sheet gets a `~2`,
//!   `~3`, ... suffix, still within 31 characters

pub mod xlsx;

use crate::models::Table;

pub use xlsx::{output_path, sanitize_filename, write_workbook};

/// Label of the raw data sheet, always first.
pub const RAW_SHEET: &str = "RAW";

/// Maximum sheet-name length in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

const EMPTY_SHEET_NAME: &str = "VIEW";

/// One named sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
}

/// Ordered sheets ready for writing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportBundle {
    sheets: Vec<Sheet>,
}

impl ExportBundle {
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Table stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|s| s.name == name).map(|s| &s.table)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Sequence `raw` and the available `views` into a bundle.
///
/// `RAW` comes first, then views in the given order. A view whose table
/// is `None` (e.g. the pivot could not be built) gets no sheet.
pub fn assemble(raw: Table, views: Vec<(String, Option<Table>)>) -> ExportBundle {
    let mut sheets = vec![Sheet {
        name: RAW_SHEET.to_string(),
        table: raw,
    }];

    for (label, table) in views {
        let Some(table) = table else { continue };
        let used: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        let name = unique_sheet_name(&sanitize_sheet_name(&label), &used);
        sheets.push(Sheet { name, table });
    }

    ExportBundle { sheets }
}

/// Replace forbidden characters and cut to [`MAX_SHEET_NAME_LEN`].
///
/// Leading and trailing apostrophes are dropped; the xlsx format forbids them.
pub fn sanitize_sheet_name(label: &str) -> String {
    let replaced: String = label
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cut: String = replaced
        .trim_matches(is_sheet_edge_char)
        .chars()
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cut.trim_end_matches(is_sheet_edge_char);

    if cleaned.is_empty() {
        EMPTY_SHEET_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_sheet_edge_char(c: char) -> bool {
    c == '\'' || c.is_whitespace()
}

fn unique_sheet_name(name: &str, used: &[&str]) -> String {
    disambiguate(name, MAX_SHEET_NAME_LEN, |candidate| {
        let lower = candidate.to_lowercase();
        used.iter().any(|u| u.to_lowercase() == lower)
    })
}

/// First of `name`, `name~2`, `name~3`, ... that is not `taken`.
///
/// Suffixed candidates shorten `name` so the result stays within `max_len`
/// characters.
pub(crate) fn disambiguate<F>(name: &str, max_len: usize, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !taken(name) {
        return name.to_string();
    }

    let mut n = 2usize;
    loop {
        let suffix = format!("~{}", n);
        let room = max_len.saturating_sub(suffix.chars().count());
        let candidate: String = name.chars().take(room).chain(suffix.chars()).collect();
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(tag: &str) -> Table {
        Table::from_records(vec![json!({ "tag": tag }).as_object().unwrap().clone()])
    }

    #[test]
    fn test_raw_first_then_views_in_order() {
        let bundle = assemble(
            table("raw"),
            vec![
                ("TABLE_VIEW".into(), Some(table("pivot"))),
                ("CHANGE".into(), Some(table("change"))),
            ],
        );
        assert_eq!(bundle.names(), vec!["RAW", "TABLE_VIEW", "CHANGE"]);
        assert_eq!(bundle.get("CHANGE"), Some(&table("change")));
    }

    #[test]
    fn test_missing_view_skipped() {
        let bundle = assemble(
            table("raw"),
            vec![
                ("TABLE_VIEW".into(), None),
                ("CHANGE".into(), Some(table("change"))),
            ],
        );
        assert_eq!(bundle.names(), vec!["RAW", "CHANGE"]);
    }

    #[test]
    fn test_long_label_truncated() {
        let label = "A".repeat(40);
        let bundle = assemble(table("raw"), vec![(label, Some(table("v")))]);
        assert_eq!(bundle.names()[1], "A".repeat(31));
    }

    #[test]
    fn test_truncation_collision_disambiguated() {
        let a = format!("{}_population", "X".repeat(30));
        let b = format!("{}_households", "X".repeat(30));
        let bundle = assemble(
            table("raw"),
            vec![(a, Some(table("a"))), (b, Some(table("b")))],
        );

        let names = bundle.names();
        assert_eq!(names.len(), 3);
        assert_eq!(names[1], format!("{}_", "X".repeat(30)));
        assert_eq!(names[2], format!("{}~2", "X".repeat(29)));
        assert!(names.iter().all(|n| n.chars().count() <= MAX_SHEET_NAME_LEN));
    }

    #[test]
    fn test_collision_with_raw_is_case_insensitive() {
        let bundle = assemble(
            table("raw"),
            vec![
                ("raw".into(), Some(table("v1"))),
                ("Raw".into(), Some(table("v2"))),
            ],
        );
        assert_eq!(bundle.names(), vec!["RAW", "raw~2", "Raw~3"]);
    }

    #[test]
    fn test_apostrophe_edges_stripped() {
        let bundle = assemble(
            table("raw"),
            vec![
                ("'Monthly'".into(), Some(table("v1"))),
                ("''".into(), Some(table("v2"))),
                ("O'Brien".into(), Some(table("v3"))),
            ],
        );
        assert_eq!(bundle.names(), vec!["RAW", "Monthly", "VIEW", "O'Brien"]);

        let label = format!("{}'x", "A".repeat(30));
        assert_eq!(sanitize_sheet_name(&label), "A".repeat(30));
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  "), "VIEW");
        assert_eq!(sanitize_sheet_name("인구 추이"), "인구 추이");
        assert_eq!(sanitize_sheet_name(&"가".repeat(40)).chars().count(), 31);
    }
}
