//! CSV output writer.
//!
//! Renders transformed records back to delimited text. The header and cell
//! order come from the recipe's output columns, so the output schema is a
//! deterministic function of the recipe; the same records always produce
//! byte-identical output.

use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{WriteError, WriteResult};

/// Write records as CSV to `path`.
///
/// The parent directory is created if needed. Cells are looked up by column
/// name; missing cells and nulls render as empty.
pub fn write_csv(path: &Path, columns: &[String], records: &[Value]) -> WriteResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if parent.exists() && !parent.is_dir() {
                return Err(WriteError::InvalidParent(parent.display().to_string()));
            }
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    write_records(&mut writer, columns, records)?;
    writer.flush()?;
    Ok(())
}

/// Render records as a CSV string.
pub fn csv_string(columns: &[String], records: &[Value]) -> WriteResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_records(&mut writer, columns, records)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| WriteError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

fn write_records<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    columns: &[String],
    records: &[Value],
) -> WriteResult<()> {
    writer.write_record(columns)?;

    for record in records {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| render_cell(record.get(col)))
            .collect();
        writer.write_record(&cells)?;
    }

    Ok(())
}

/// Render a single JSON value as a CSV cell.
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "name".to_string(), "score".to_string()]
    }

    #[test]
    fn test_csv_string_rendering() {
        let records = vec![
            json!({"id": 1, "name": "Alice", "score": 0.8}),
            json!({"id": 2, "name": "Bob", "score": Value::Null}),
        ];

        let out = csv_string(&columns(), &records).unwrap();
        assert_eq!(out, "id,name,score\n1,Alice,0.8\n2,Bob,\n");
    }

    #[test]
    fn test_header_only_output() {
        let out = csv_string(&columns(), &[]).unwrap();
        assert_eq!(out, "id,name,score\n");
    }

    #[test]
    fn test_float_rendering_keeps_fraction_marker() {
        let records = vec![json!({"id": 1, "name": "x", "score": 35.0})];
        let out = csv_string(&columns(), &records).unwrap();
        assert!(out.contains("35.0"));
    }

    #[test]
    fn test_cells_with_delimiter_are_quoted() {
        let records = vec![json!({"id": 1, "name": "Smith, Alice", "score": 2})];
        let out = csv_string(&columns(), &records).unwrap();
        assert!(out.contains("\"Smith, Alice\""));
    }

    #[test]
    fn test_write_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("out.csv");

        let records = vec![json!({"id": 1, "name": "a", "score": 2})];
        write_csv(&path, &columns(), &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("id,name,score\n"));
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let records = vec![
            json!({"id": 1, "name": "a", "score": 0.5}),
            json!({"id": 2, "name": "b", "score": 1.5}),
        ];

        write_csv(&path, &columns(), &records).unwrap();
        let first = std::fs::read(&path).unwrap();

        write_csv(&path, &columns(), &records).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }
}
