//! File parsing: CSV and spreadsheet uploads into header-keyed rows

use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::{ByteRecord, ReaderBuilder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::value::CellValue;

/// Spreadsheets always expose at least columns A..Z
const MIN_SHEET_COLUMNS: usize = 26;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Kind of uploaded file, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Spreadsheet,
    Unknown,
}

impl FileKind {
    /// Detect the kind from a file name's extension (case-insensitive)
    pub fn from_name(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("csv") => FileKind::Csv,
            Some("xlsx") | Some("xls") => FileKind::Spreadsheet,
            _ => FileKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Unknown => "unknown",
        }
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// One data row, keyed by header name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row(HashMap<String, CellValue>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value under `header`; missing keys read as `Empty`
    pub fn get(&self, header: &str) -> &CellValue {
        self.0.get(header).unwrap_or(&EMPTY_CELL)
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<CellValue>) {
        self.0.insert(header.into(), value.into());
    }

    /// True when every cell is empty
    pub fn is_blank(&self) -> bool {
        self.0.values().all(CellValue::is_empty)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Tabular content of an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFile {
    pub file_name: String,
    pub kind: FileKind,
    /// Ordered, unique column names
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Errors that can occur while reading an upload
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unsupported file type: '{0}'. Please upload a CSV or Excel file (.csv, .xlsx, .xls)")]
    UnsupportedFileType(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    #[error("Workbook '{0}' contains no sheets")]
    NoSheets(String),

    #[error("No header row found in '{0}'")]
    NoHeaders(String),
}

/// Parse a file on disk, choosing the reader by extension
pub fn parse_file(path: &Path) -> Result<ParsedFile, ParseError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    if FileKind::from_name(&name) == FileKind::Unknown {
        return Err(ParseError::UnsupportedFileType(name));
    }

    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_bytes(&name, &bytes)
}

/// Parse an in-memory upload with its declared file name
pub fn parse_bytes(name: &str, bytes: &[u8]) -> Result<ParsedFile, ParseError> {
    match FileKind::from_name(name) {
        FileKind::Csv => parse_csv(name, bytes),
        FileKind::Spreadsheet => parse_spreadsheet(name, bytes),
        FileKind::Unknown => Err(ParseError::UnsupportedFileType(name.to_string())),
    }
}

fn parse_csv(name: &str, bytes: &[u8]) -> Result<ParsedFile, ParseError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let raw_headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    if raw_headers.iter().all(String::is_empty) {
        return Err(ParseError::NoHeaders(name.to_string()));
    }

    let records: Vec<ByteRecord> = rdr.byte_records().collect::<Result<_, _>>()?;

    // Fields past the header row still get a synthesized column
    let width = records
        .iter()
        .map(ByteRecord::len)
        .chain(std::iter::once(raw_headers.len()))
        .max()
        .unwrap_or(0);
    let headers = normalize_headers(raw_headers, width);

    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let value = record
                        .get(idx)
                        .map(|field| CellValue::text(String::from_utf8_lossy(field)))
                        .unwrap_or_default();
                    (header.clone(), value)
                })
                .collect::<Row>()
        })
        .filter(|row| !row.is_blank())
        .collect();

    Ok(ParsedFile {
        file_name: name.to_string(),
        kind: FileKind::Csv,
        headers,
        rows,
    })
}

fn parse_spreadsheet(name: &str, bytes: &[u8]) -> Result<ParsedFile, ParseError> {
    let cursor = Cursor::new(bytes.to_vec());
    let range = match extension(name).as_deref() {
        Some("xls") => {
            let mut workbook: Xls<_> =
                Xls::new(cursor).map_err(|e| ParseError::Workbook(e.to_string()))?;
            first_sheet(&mut workbook, name)?
        }
        _ => {
            let mut workbook: Xlsx<_> =
                Xlsx::new(cursor).map_err(|e| ParseError::Workbook(e.to_string()))?;
            first_sheet(&mut workbook, name)?
        }
    };

    let (last_row, last_col) = range
        .end()
        .ok_or_else(|| ParseError::NoHeaders(name.to_string()))?;
    let width = (last_col as usize + 1).max(MIN_SHEET_COLUMNS);

    let cell = |row: u32, col: usize| -> CellValue {
        range
            .get_value((row, col as u32))
            .map(sheet_cell)
            .unwrap_or_default()
    };

    let raw_headers: Vec<String> = (0..width)
        .map(|col| cell(0, col).to_plain_string().trim().to_string())
        .collect();
    let headers = normalize_headers(raw_headers, width);

    let rows = (1..=last_row)
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(col, header)| (header.clone(), cell(row, col)))
                .collect::<Row>()
        })
        .filter(|row| !row.is_blank())
        .collect();

    Ok(ParsedFile {
        file_name: name.to_string(),
        kind: FileKind::Spreadsheet,
        headers,
        rows,
    })
}

fn first_sheet<RS, R>(workbook: &mut R, name: &str) -> Result<Range<Data>, ParseError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::NoSheets(name.to_string()))?
        .map_err(|e| ParseError::Workbook(e.to_string()))
}

/// Date cells keep their numeric serial; the importer converts them
fn sheet_cell(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

/// Pad to `width`, name blank columns by letter and suffix repeats
fn normalize_headers(mut raw: Vec<String>, width: usize) -> Vec<String> {
    raw.resize(width.max(raw.len()), String::new());

    let mut seen: HashSet<String> = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = if header.is_empty() {
                format!("Column {}", column_letter(idx))
            } else {
                header
            };
            let mut candidate = base.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{} ({})", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

/// Spreadsheet column name for a zero-based index (0 -> A, 26 -> AA)
pub fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_name() {
        assert_eq!(FileKind::from_name("contacts.csv"), FileKind::Csv);
        assert_eq!(FileKind::from_name("Contacts.XLSX"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_name("old.xls"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_name("notes.txt"), FileKind::Unknown);
        assert_eq!(FileKind::from_name("noext"), FileKind::Unknown);
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_normalize_headers_fills_blanks_and_dedupes() {
        let headers = normalize_headers(
            vec!["Name".into(), "".into(), "Email".into(), "Email".into()],
            5,
        );
        assert_eq!(
            headers,
            vec!["Name", "Column B", "Email", "Email (2)", "Column E"]
        );
    }

    #[test]
    fn test_parse_csv_basic() {
        let csv = "name,email,job title,tags\nJane Doe,jane@x.com,Engineer,\"ops,lead\"\n";
        let parsed = parse_bytes("people.csv", csv.as_bytes()).unwrap();

        assert_eq!(parsed.kind, FileKind::Csv);
        assert_eq!(parsed.headers, vec!["name", "email", "job title", "tags"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].get("name"), &CellValue::text("Jane Doe"));
        assert_eq!(parsed.rows[0].get("tags"), &CellValue::text("ops,lead"));
    }

    #[test]
    fn test_parse_csv_skips_empty_lines_and_blank_rows() {
        let csv = "name,email\nA,a@x.com\n\n,\nB,b@x.com\n";
        let parsed = parse_bytes("people.csv", csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].get("name"), &CellValue::text("B"));
    }

    #[test]
    fn test_parse_csv_short_rows_are_padded() {
        let csv = "name,email,company\nA\n";
        let parsed = parse_bytes("people.csv", csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows[0].get("company"), &CellValue::Empty);
        assert_eq!(parsed.rows[0].len(), 3);
    }

    #[test]
    fn test_parse_csv_extra_fields_get_synthesized_headers() {
        let csv = "name,email\nA,a@x.com,Acme\n";
        let parsed = parse_bytes("people.csv", csv.as_bytes()).unwrap();
        assert_eq!(parsed.headers, vec!["name", "email", "Column C"]);
        assert_eq!(parsed.rows[0].get("Column C"), &CellValue::text("Acme"));
    }

    #[test]
    fn test_parse_rejects_unknown_extension() {
        let err = parse_bytes("people.txt", b"name\nA\n").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_parse_csv_without_headers_fails() {
        let err = parse_bytes("empty.csv", b"").unwrap_err();
        assert!(matches!(err, ParseError::NoHeaders(_)));
    }

    #[test]
    fn test_parse_corrupt_workbook_fails() {
        let err = parse_bytes("broken.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ParseError::Workbook(_)));
    }

    #[test]
    fn test_parse_xlsx_pads_headers_and_keeps_empty_cells() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Full Name").unwrap();
        sheet.write_string(0, 2, "Email").unwrap();
        sheet.write_string(1, 0, "Jane Doe").unwrap();
        sheet.write_string(1, 1, "untitled data").unwrap();
        sheet.write_number(1, 3, 45292.0).unwrap();
        sheet.write_string(3, 0, "John Roe").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = parse_bytes("contacts.xlsx", &bytes).unwrap();

        assert_eq!(parsed.kind, FileKind::Spreadsheet);
        assert_eq!(parsed.headers.len(), MIN_SHEET_COLUMNS);
        assert_eq!(parsed.headers[0], "Full Name");
        assert_eq!(parsed.headers[1], "Column B");
        assert_eq!(parsed.headers[2], "Email");
        assert_eq!(parsed.headers[3], "Column D");

        // Row 3 (index 2) is blank and skipped
        assert_eq!(parsed.rows.len(), 2);
        let first = &parsed.rows[0];
        assert_eq!(first.get("Column B"), &CellValue::text("untitled data"));
        assert_eq!(first.get("Email"), &CellValue::Empty);
        assert_eq!(first.get("Column D"), &CellValue::Number(45292.0));
        assert_eq!(first.len(), MIN_SHEET_COLUMNS);
        assert_eq!(parsed.rows[1].get("Full Name"), &CellValue::text("John Roe"));
    }
}
