use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::constants::ingestion::{DELIMITED_EXTENSIONS, UTF8_BOM, WORKBOOK_EXTENSIONS, ZIP_MAGIC};
use crate::constants::schema::COL_NAME;
use crate::data::{ColumnName, ProductRecord, RecordSet};
use crate::errors::TransferError;
use crate::utils::{normalize_inline_whitespace, render_number};

/// Tabular upload formats accepted by [`parse_upload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadFormat {
    /// Office Open XML workbook (`.xlsx`); only the first sheet is read.
    Workbook,
    /// Comma-delimited text (`.csv`).
    Delimited,
}

impl UploadFormat {
    /// Format implied by a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            Some(UploadFormat::Workbook)
        } else if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
            Some(UploadFormat::Delimited)
        } else {
            None
        }
    }

    /// Guess the format from content: ZIP containers are workbooks.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            UploadFormat::Workbook
        } else {
            UploadFormat::Delimited
        }
    }

    /// Extension first, content second.
    pub fn detect(name: &str, bytes: &[u8]) -> Self {
        Self::from_file_name(name).unwrap_or_else(|| Self::sniff(bytes))
    }
}

/// One row of cell texts; `None` marks an empty cell.
type Row = Vec<Option<String>>;

/// Parse an uploaded file into a record set.
///
/// The first row supplies column headers and every later row becomes one
/// record. Structural failures return [`TransferError::Parse`] and produce no
/// partial output.
pub fn parse_upload(bytes: &[u8], format: UploadFormat) -> Result<RecordSet, TransferError> {
    let rows = match format {
        UploadFormat::Workbook => workbook_rows(bytes)?,
        UploadFormat::Delimited => delimited_rows(bytes)?,
    };
    let records = records_from_rows(rows)?;
    info!(
        "[salesdeck:ingest] parsed {} records from {:?} upload",
        records.len(),
        format
    );
    Ok(records)
}

/// Read and parse an upload from disk, detecting its format.
pub fn parse_upload_file(path: &Path) -> Result<RecordSet, TransferError> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_upload(&bytes, UploadFormat::detect(&name, &bytes))
}

fn workbook_rows(bytes: &[u8]) -> Result<Vec<Row>, TransferError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|err| TransferError::Parse(format!("failed to read xlsx workbook: {err}")))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TransferError::Parse("workbook contains no sheets".into()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| TransferError::Parse(format!("sheet '{sheet_name}' is missing")))?
        .map_err(|err| TransferError::Parse(format!("failed to read sheet '{sheet_name}': {err}")))?;
    debug!(
        "[salesdeck:ingest] reading sheet '{sheet_name}' ({} rows)",
        range.height()
    );
    Ok(range
        .rows()
        .map(|row| row.iter().map(workbook_cell_text).collect())
        .collect())
}

fn workbook_cell_text(cell: &DataType) -> Option<String> {
    let text = match cell {
        DataType::String(text) => text.clone(),
        DataType::Float(value) => render_number(*value),
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::DateTime(serial) | DataType::Duration(serial) => render_number(*serial),
        DataType::DateTimeIso(text) | DataType::DurationIso(text) => text.clone(),
        DataType::Error(_) | DataType::Empty => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn delimited_rows(bytes: &[u8]) -> Result<Vec<Row>, TransferError> {
    let input = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|err| TransferError::Parse(format!("failed to read csv: {err}")))?;
        rows.push(
            record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

fn records_from_rows(rows: Vec<Row>) -> Result<RecordSet, TransferError> {
    let mut rows = rows.into_iter();
    let Some(header_row) = rows.next() else {
        return Ok(RecordSet::default());
    };
    let headers = header_columns(header_row);
    if !headers.iter().flatten().any(|column| column == COL_NAME) {
        return Err(TransferError::Parse(format!(
            "header row has no '{COL_NAME}' column"
        )));
    }

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        // Spreadsheet row numbers are 1-based and the header occupies row 1.
        let row_number = offset + 2;
        let mut cells: IndexMap<ColumnName, String> = IndexMap::new();
        for (column, value) in headers.iter().zip(row) {
            if let (Some(column), Some(value)) = (column, value) {
                cells.insert(column.clone(), value);
            }
        }
        if cells.is_empty() {
            continue;
        }
        match ProductRecord::from_cells(cells) {
            Ok(record) => records.push(record),
            Err(err) => warn!("[salesdeck:ingest] skipping row {row_number}: {err}"),
        }
    }
    Ok(RecordSet::new(records))
}

/// Normalize header texts; blank and repeated headers map to `None`.
fn header_columns(row: Row) -> Vec<Option<ColumnName>> {
    let mut seen = HashSet::new();
    row.into_iter()
        .enumerate()
        .map(|(idx, cell)| {
            let column = cell
                .map(normalize_inline_whitespace)
                .filter(|column| !column.is_empty())?;
            if seen.insert(column.clone()) {
                Some(column)
            } else {
                warn!("[salesdeck:ingest] ignoring repeated header '{column}' in column {}", idx + 1);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_become_records_in_order() {
        let csv = "Product Name,Definition (Simple),Region\nWidget,A widget,North\nGadget,\"A gadget, improved\",\n";
        let records = parse_upload(csv.as_bytes(), UploadFormat::Delimited).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records.records()[0].name, "Widget");
        assert_eq!(records.records()[0].field("Region"), Some("North"));
        assert_eq!(
            records.records()[1].definition.as_deref(),
            Some("A gadget, improved")
        );
        assert_eq!(records.records()[1].field("Region"), None);
    }

    #[test]
    fn cell_text_is_kept_verbatim() {
        let csv = "Product Name,Cold Call Script\nWidget,\"  Hi there,\nthis is Sam.  \"\n";
        let records = parse_upload(csv.as_bytes(), UploadFormat::Delimited).unwrap();
        assert_eq!(
            records.records()[0].cold_call_script.as_deref(),
            Some("  Hi there,\nthis is Sam.  ")
        );
    }

    #[test]
    fn bom_and_header_whitespace_are_normalized() {
        let csv = "\u{feff} Product  Name ,Common Uses\nWidget,Lighting\n";
        let records = parse_upload(csv.as_bytes(), UploadFormat::Delimited).unwrap();
        assert_eq!(records.records()[0].name, "Widget");
        assert_eq!(records.records()[0].common_uses.as_deref(), Some("Lighting"));
    }

    #[test]
    fn blank_and_unnamed_rows_are_skipped() {
        let csv = "Product Name,Common Uses\n,\nWidget,Lighting\n,Orphan use\nGadget,\n";
        let records = parse_upload(csv.as_bytes(), UploadFormat::Delimited).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Widget", "Gadget"]);
    }

    #[test]
    fn missing_name_column_is_parse_error() {
        let csv = "Name,Uses\nWidget,Lighting\n";
        assert!(matches!(
            parse_upload(csv.as_bytes(), UploadFormat::Delimited),
            Err(TransferError::Parse(_))
        ));
    }

    #[test]
    fn empty_upload_yields_empty_set() {
        let records = parse_upload(b"", UploadFormat::Delimited).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn invalid_utf8_csv_is_parse_error() {
        let bytes = b"Product Name\n\xff\xfe\n";
        assert!(matches!(
            parse_upload(bytes, UploadFormat::Delimited),
            Err(TransferError::Parse(_))
        ));
    }

    #[test]
    fn unreadable_workbook_is_parse_error() {
        assert!(matches!(
            parse_upload(b"definitely not a zip", UploadFormat::Workbook),
            Err(TransferError::Parse(_))
        ));
    }

    #[test]
    fn repeated_headers_keep_first_column() {
        let csv = "Product Name,Notes,Notes\nWidget,first,second\n";
        let records = parse_upload(csv.as_bytes(), UploadFormat::Delimited).unwrap();
        assert_eq!(records.records()[0].field("Notes"), Some("first"));
    }

    #[test]
    fn format_detection() {
        assert_eq!(
            UploadFormat::from_file_name("Products.XLSX"),
            Some(UploadFormat::Workbook)
        );
        assert_eq!(
            UploadFormat::from_file_name("products.csv"),
            Some(UploadFormat::Delimited)
        );
        assert_eq!(UploadFormat::from_file_name("products"), None);
        assert_eq!(UploadFormat::sniff(b"PK\x03\x04rest"), UploadFormat::Workbook);
        assert_eq!(
            UploadFormat::detect("upload.bin", b"Product Name\n"),
            UploadFormat::Delimited
        );
    }
}
