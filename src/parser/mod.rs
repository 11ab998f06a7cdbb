//! CSV reader with encoding and delimiter auto-detection.
//!
//! Reads raw bytes, detects the character encoding (chardet) and the
//! delimiter (candidate counting over the first line), decodes with
//! encoding_rs, then parses with the `csv` crate. Each data row becomes a
//! JSON object keyed by header, so the rest of the pipeline works on plain
//! `serde_json::Value` rows.

use serde_json::{json, Map, Value};
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// An in-memory table: ordered headers plus rows as JSON objects,
/// with the detection metadata of the source file.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Column headers, in file order.
    pub headers: Vec<String>,
    /// Data rows as JSON objects keyed by header.
    pub rows: Vec<Value>,
    /// Detected or assumed encoding.
    pub encoding: String,
    /// Detected or specified delimiter.
    pub delimiter: char,
}

impl ParsedTable {
    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8 so a stray byte never
/// aborts the run before the CSV structure can be inspected.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => encoding_rs::UTF_8.decode(bytes).0.to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.to_string(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    };
    Ok(decoded)
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let table = parse_file_auto("data/sample_input.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", table.encoding, table.delimiter);
/// println!("Rows: {}", table.row_count());
/// ```
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParsedTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParsedTable> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_str(&content, delimiter, encoding)
}

/// Parse a CSV file with an explicit delimiter.
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: char) -> CsvResult<ParsedTable> {
    let bytes = std::fs::read(path.as_ref())?;
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding)?;
    parse_str(&content, delimiter, encoding)
}

/// Parse decoded CSV content with an explicit delimiter.
///
/// Rows shorter than the header are padded with empty cells; longer rows
/// are truncated to the header width. Fully blank lines are skipped.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> CsvResult<ParsedTable> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvError::ParseError(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| CsvError::ParseError(e.to_string()))?;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("");
            obj.insert(header.clone(), json!(value));
        }
        rows.push(Value::Object(obj));
    }

    Ok(ParsedTable {
        headers,
        rows,
        encoding,
        delimiter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("name,age\nAlice,30\nBob,25", ',', "utf-8".into()).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["name"], "Alice");
        assert_eq!(table.rows[0]["age"], "30");
        assert_eq!(table.rows[1]["name"], "Bob");
        assert_eq!(table.rows[1]["age"], "25");
    }

    #[test]
    fn test_semicolon_delimiter() {
        let table = parse_str("a;b;c\n1;2;3", ';', "utf-8".into()).unwrap();

        assert_eq!(table.rows[0]["a"], "1");
        assert_eq!(table.rows[0]["b"], "2");
        assert_eq!(table.rows[0]["c"], "3");
    }

    #[test]
    fn test_quoted_values_with_embedded_delimiter() {
        let csv = "name,value\n\"Smith, Alice\",\"Hello World\"";
        let table = parse_str(csv, ',', "utf-8".into()).unwrap();

        assert_eq!(table.rows[0]["name"], "Smith, Alice");
        assert_eq!(table.rows[0]["value"], "Hello World");
    }

    #[test]
    fn test_short_rows_padded() {
        let table = parse_str("a,b,c\n1,2", ',', "utf-8".into()).unwrap();

        assert_eq!(table.rows[0]["a"], "1");
        assert_eq!(table.rows[0]["b"], "2");
        assert_eq!(table.rows[0]["c"], "");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let table = parse_str("a,b\n1,2,3,4", ',', "utf-8".into()).unwrap();

        assert_eq!(table.rows[0]["a"], "1");
        assert_eq!(table.rows[0]["b"], "2");
        assert!(table.rows[0].get("c").is_none());
    }

    #[test]
    fn test_header_only_input() {
        let table = parse_str("id,category,value1,value2\n", ',', "utf-8".into()).unwrap();

        assert_eq!(table.headers, vec!["id", "category", "value1", "value2"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_empty_input_is_error() {
        let result = parse_bytes_auto(b"");
        assert!(matches!(result, Err(CsvError::EmptyFile)));

        let result = parse_str("   \n", ',', "utf-8".into());
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "id;category;value1\n1;A;15\n2;B;25";
        let table = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(table.delimiter, ';');
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.headers, vec!["id", "category", "value1"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert!(decoded.contains("Soci"));
    }
}
