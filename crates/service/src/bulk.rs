//! Spreadsheet ingestion shared by provider and product bulk uploads.
//!
//! A file is read into a [`Sheet`] of string rows keyed by lower-cased header,
//! each row is validated on its own, and the outcome is summarized in a
//! [`BulkReport`] whose successful and rejected counts add up to the row count.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::time::Instant;

use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};
use chrono::NaiveTime;
use serde::Serialize;

use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub headers: Vec<String>,
    /// `(row number, values)`; row 1 is the header, so data starts at 2.
    pub rows: Vec<(usize, Row)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub values: Row,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub total: usize,
    pub successful: usize,
    pub rejected: usize,
    pub success_rate: String,
    pub rejected_rows: Vec<RejectedRow>,
    pub message: String,
    pub elapsed_secs: f64,
}

impl BulkReport {
    pub fn new(total: usize, successful: usize, rejected_rows: Vec<RejectedRow>, started: Instant) -> Self {
        let rate = success_rate(successful, total);
        Self {
            total,
            successful,
            rejected: rejected_rows.len(),
            success_rate: format!("{rate:.2}%"),
            rejected_rows,
            message: String::new(),
            elapsed_secs: (started.elapsed().as_secs_f64() * 100.0).round() / 100.0,
        }
    }

    pub fn rate(&self) -> f64 {
        success_rate(self.successful, self.total)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

pub fn success_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        successful as f64 / total as f64 * 100.0
    }
}

enum Format {
    Csv,
    Xlsx,
}

fn format_of(filename: &str) -> Result<Format, ServiceError> {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".csv") {
        Ok(Format::Csv)
    } else if lower.ends_with(".xlsx") {
        Ok(Format::Xlsx)
    } else {
        Err(ServiceError::Validation("file: unsupported format, use CSV or XLSX".into()))
    }
}

/// Parse the upload and check that every `required` column is present.
pub fn read_sheet(file: &UploadedFile, required: &[&str]) -> Result<Sheet, ServiceError> {
    let (headers, raw_rows) = match format_of(&file.filename)? {
        Format::Csv => read_csv(&file.bytes)?,
        Format::Xlsx => read_xlsx(&file.bytes)?,
    };
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let missing: Vec<&str> = required.iter().copied().filter(|c| !headers.iter().any(|h| h == c)).collect();
    if !missing.is_empty() {
        return Err(ServiceError::Validation(format!("file: missing columns: {}", missing.join(", "))));
    }

    let rows = raw_rows
        .into_iter()
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|(i, cells)| {
            let row = headers
                .iter()
                .enumerate()
                .filter(|(_, h)| !h.is_empty())
                .map(|(col, h)| (h.clone(), cells.get(col).map(|c| c.trim().to_string()).unwrap_or_default()))
                .collect();
            (i + 2, row)
        })
        .collect();
    Ok(Sheet { headers, rows })
}

fn read_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), ServiceError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| ServiceError::Validation(format!("file: unreadable CSV header: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ServiceError::Validation(format!("file: unreadable CSV row: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        // Date-formatted cells hold a serial day number.
        DataType::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        other => other.to_string(),
    }
}

fn read_xlsx(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), ServiceError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ServiceError::Validation(format!("file: unreadable XLSX: {e}")))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(ServiceError::Validation(format!("file: unreadable worksheet: {e}"))),
        None => return Err(ServiceError::Validation("file: workbook has no worksheets".into())),
    };
    let mut rows = range.rows().map(|r| r.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok((headers, rows.collect()))
}

/// Partition rows with `check`, which returns either a value to keep or the
/// rejection reason.
pub fn partition<T, F>(sheet: Sheet, mut check: F) -> (Vec<T>, Vec<RejectedRow>)
where
    F: FnMut(&Row) -> Result<T, String>,
{
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for (row, values) in sheet.rows {
        match check(&values) {
            Ok(v) => accepted.push(v),
            Err(error) => rejected.push(RejectedRow { row, values, error }),
        }
    }
    (accepted, rejected)
}

/// Non-empty cell value, or `None`.
pub fn cell(row: &Row, column: &str) -> Option<String> {
    row.get(column).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_file(body: &str) -> UploadedFile {
        UploadedFile { filename: "providers.CSV".into(), bytes: body.as_bytes().to_vec() }
    }

    #[test]
    fn csv_headers_are_normalized() {
        let sheet = read_sheet(&csv_file(" Name ,NIT\nAcme,9001234567\n,\nBeta,123\n"), &["name", "nit"]).unwrap();
        assert_eq!(sheet.headers, vec!["name", "nit"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].0, 2);
        assert_eq!(sheet.rows[1].0, 4);
        assert_eq!(sheet.rows[1].1["nit"], "123");
    }

    #[test]
    fn missing_columns_are_listed() {
        let err = read_sheet(&csv_file("name\nAcme\n"), &["name", "nit", "email"]).unwrap_err();
        assert_eq!(err.to_string(), "file: missing columns: nit, email");
    }

    #[test]
    fn unsupported_and_corrupt_files() {
        let txt = UploadedFile { filename: "data.txt".into(), bytes: b"x".to_vec() };
        assert!(matches!(read_sheet(&txt, &[]), Err(ServiceError::Validation(_))));
        let bad = UploadedFile { filename: "data.xlsx".into(), bytes: b"not a zip".to_vec() };
        assert!(matches!(read_sheet(&bad, &[]), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn date_cells_read_as_iso_dates() {
        // 72716 is 2099-01-31 in Excel's day numbering.
        assert_eq!(cell_text(&DataType::DateTime(72716.0)), "2099-01-31");
        assert_eq!(cell_text(&DataType::DateTime(72716.5)), "2099-01-31 12:00:00");
        assert_eq!(cell_text(&DataType::Float(72716.0)), "72716");
    }

    #[test]
    fn xlsx_sheet_with_a_date_column() -> anyhow::Result<()> {
        use rust_xlsxwriter::{Format, Workbook};

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name")?;
        sheet.write_string(0, 1, "Expiration_Date")?;
        sheet.write_string(1, 0, "Gasa esteril")?;
        let date = chrono::NaiveDate::from_ymd_opt(2099, 1, 31).unwrap();
        sheet.write_datetime_with_format(1, 1, &date, &Format::new().set_num_format("yyyy-mm-dd"))?;
        let file = UploadedFile { filename: "products.xlsx".into(), bytes: workbook.save_to_buffer()? };

        let parsed = read_sheet(&file, &["name", "expiration_date"])?;
        assert_eq!(parsed.rows.len(), 1);
        let (row, values) = &parsed.rows[0];
        assert_eq!(*row, 2);
        assert_eq!(values["name"], "Gasa esteril");
        assert_eq!(values["expiration_date"], "2099-01-31");
        Ok(())
    }

    #[test]
    fn partition_counts_add_up() {
        let sheet = read_sheet(&csv_file("n\n1\n2\nx\n4\n"), &["n"]).unwrap();
        let total = sheet.rows.len();
        let (ok, rejected) = partition(sheet, |row| row["n"].parse::<i32>().map_err(|_| "not a number".to_string()));
        assert_eq!(ok, vec![1, 2, 4]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].row, 4);
        assert_eq!(ok.len() + rejected.len(), total);

        let report = BulkReport::new(total, ok.len(), rejected, Instant::now());
        assert_eq!(report.success_rate, "75.00%");
        assert_eq!(report.rejected, 1);
    }

    #[test]
    fn empty_upload_rate_is_zero() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(BulkReport::new(0, 0, vec![], Instant::now()).success_rate, "0.00%");
    }
}
