// Query results
// Converts the raw shape fetched from the store into JSON keyed by column name

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single row: column name -> scalar value, in result-column order
pub type JsonRow = Map<String, Value>;

/// What the store handed back, before column names are attached
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// Zero or more rows (the fetch-all path)
    Rows(Vec<Vec<Value>>),
    /// Exactly one row, not wrapped in an outer sequence (the fetch-one path)
    Row(Vec<Value>),
}

impl RawResult {
    /// Attach column names to the raw values
    ///
    /// `columns` must be the columns of the statement that produced this data.
    /// A row whose width differs from the column count has no sensible mapping
    /// and is reported as a serialization failure.
    pub fn into_result_set(self, columns: &[String]) -> Result<ResultSet> {
        match self {
            RawResult::Rows(rows) => {
                let rows = rows
                    .into_iter()
                    .map(|row| zip_row(columns, row))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ResultSet::Rows(rows))
            }
            RawResult::Row(row) => Ok(ResultSet::Row(zip_row(columns, row)?)),
        }
    }
}

fn zip_row(columns: &[String], values: Vec<Value>) -> Result<JsonRow> {
    if values.len() != columns.len() {
        return Err(GateError::serialization(format!(
            "row has {} values but the result has {} columns",
            values.len(),
            columns.len()
        )));
    }

    Ok(columns.iter().cloned().zip(values).collect())
}

/// The JSON value returned to callers
///
/// Serializes untagged: `Rows` becomes a JSON array of objects and `Row`
/// becomes a bare object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultSet {
    Rows(Vec<JsonRow>),
    Row(JsonRow),
}

impl ResultSet {
    /// Number of rows carried by this result
    pub fn row_count(&self) -> usize {
        match self {
            ResultSet::Rows(rows) => rows.len(),
            ResultSet::Row(_) => 1,
        }
    }

    /// Convert into a plain `serde_json::Value`
    pub fn into_json(self) -> Value {
        match self {
            ResultSet::Rows(rows) => Value::Array(rows.into_iter().map(Value::Object).collect()),
            ResultSet::Row(row) => Value::Object(row),
        }
    }

    /// Format the result as a boxed text table for the terminal
    pub fn format(&self) -> String {
        let rows: Vec<&JsonRow> = match self {
            ResultSet::Rows(rows) => rows.iter().collect(),
            ResultSet::Row(row) => vec![row],
        };

        let Some(first) = rows.first() else {
            return "No rows found".to_string();
        };

        let column_names: Vec<&String> = first.keys().collect();
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                column_names
                    .iter()
                    .map(|name| row.get(*name).map(display_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        // Calculate column widths
        let mut widths: Vec<usize> = column_names.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut result = String::new();

        result.push_str(&border(&widths, '┌', '┬', '┐'));
        result.push('│');
        for (name, width) in column_names.iter().zip(&widths) {
            result.push_str(&format!(" {:<width$} ", name, width = width));
            result.push('│');
        }
        result.push('\n');
        result.push_str(&border(&widths, '├', '┼', '┤'));

        for row in &cells {
            result.push('│');
            for (cell, width) in row.iter().zip(&widths) {
                result.push_str(&format!(" {:<width$} ", cell, width = width));
                result.push('│');
            }
            result.push('\n');
        }

        result.push_str(&border(&widths, '└', '┴', '┘'));
        result.push_str(&format!("\n{} row(s) returned", rows.len()));

        result
    }
}

/// Format a table with only a header row, for results without rows
pub fn format_empty(column_names: &[String]) -> String {
    if column_names.is_empty() {
        return "No rows found".to_string();
    }

    let widths: Vec<usize> = column_names.iter().map(|c| c.chars().count()).collect();

    let mut result = border(&widths, '┌', '┬', '┐');
    result.push('│');
    for name in column_names {
        result.push_str(&format!(" {name} │"));
    }
    result.push('\n');
    result.push_str(&border(&widths, '└', '┴', '┘'));
    result.push_str("\n0 row(s) returned");

    result
}

fn border(widths: &[usize], left: char, joint: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(joint.to_string().as_str()))
}

fn display_cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_rows_become_array_of_objects() {
        let raw = RawResult::Rows(vec![vec![json!(1), json!("abc")]]);
        let result = raw.into_result_set(&columns(&["id", "term"])).unwrap();

        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"[{"id":1,"term":"abc"}]"#
        );
    }

    #[test]
    fn test_single_row_is_not_wrapped() {
        let raw = RawResult::Row(vec![json!(7), json!(null)]);
        let result = raw.into_result_set(&columns(&["n", "missing"])).unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(result.into_json(), json!({"n": 7, "missing": null}));
    }

    #[test]
    fn test_empty_rows_is_empty_array() {
        let result = RawResult::Rows(vec![])
            .into_result_set(&columns(&["id"]))
            .unwrap();
        assert_eq!(result.into_json(), json!([]));
    }

    #[test]
    fn test_column_order_is_preserved() {
        let raw = RawResult::Row(vec![json!("z"), json!("a")]);
        let result = raw.into_result_set(&columns(&["zeta", "alpha"])).unwrap();

        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"zeta":"z","alpha":"a"}"#
        );
    }

    #[test]
    fn test_width_mismatch_is_serialization_error() {
        let raw = RawResult::Rows(vec![vec![json!(1)]]);
        let err = raw.into_result_set(&columns(&["id", "term"])).unwrap_err();
        assert!(matches!(err, GateError::Serialization { .. }));
    }

    #[test]
    fn test_non_ascii_text_is_not_escaped() {
        let raw = RawResult::Row(vec![json!("ção")]);
        let result = raw.into_result_set(&columns(&["term"])).unwrap();
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"term":"ção"}"#);
    }

    #[test]
    fn test_format_table() {
        let raw = RawResult::Rows(vec![vec![json!(1), json!("abc")], vec![json!(2), json!(null)]]);
        let table = raw
            .into_result_set(&columns(&["id", "term"]))
            .unwrap()
            .format();

        assert!(table.starts_with("┌────┬──────┐\n"));
        assert!(table.contains("│ id │ term │"));
        assert!(table.contains("│ 2  │ NULL │"));
        assert!(table.ends_with("2 row(s) returned"));
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(ResultSet::Rows(vec![]).format(), "No rows found");
    }

    #[test]
    fn test_format_empty_keeps_header() {
        let table = format_empty(&columns(&["id", "term"]));

        assert!(table.starts_with("┌────┬──────┐\n"));
        assert!(table.contains("│ id │ term │\n"));
        assert!(table.ends_with("0 row(s) returned"));
        assert_eq!(format_empty(&[]), "No rows found");
    }
}
