//! Reading and writing xlsx documents.
//!
//! The store rewrites a whole workbook from what it read back, so the round trip is lossy
//! outside of what the report itself writes:
//!
//! - date and time cells come back as `YYYY-MM-DD` text,
//! - formulas are replaced by their cached values,
//! - cells to the right of a sheet's header are dropped,
//! - number formats are not read; they are reapplied by column name on write (`CTR` as a
//!   percentage).

use super::{Cell, Sheet};
use crate::error::PersistenceCause;
use calamine::{Data, Reader, Xlsx, open_workbook};
use camino::Utf8Path;
use chrono::{NaiveDate, TimeDelta};
use rust_xlsxwriter::{DocProperties, Format, Workbook};

/// Reads every sheet of the workbook at `path`, in workbook order.
///
/// The first row of each sheet's used range is taken as its header. Rows made only of empty
/// cells are skipped.
pub fn read_sheets(path: &Utf8Path) -> Result<Vec<Sheet>, PersistenceCause> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let mut rows = range.rows();

        let header = rows
            .next()
            .map(|row| row.iter().map(|data| to_cell(data).to_string()).collect::<Vec<_>>())
            .unwrap_or_default();

        let rows = rows
            .map(|row| row.iter().map(to_cell).collect::<Vec<_>>())
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();

        sheets.push(Sheet::from_parts(name, trim_trailing_empty(header), rows));
    }

    Ok(sheets)
}

/// Serializes `sheets` into an xlsx document with a bold header row and auto-fitted columns.
#[expect(unused_results, reason = "rust_xlsxwriter methods return &mut Worksheet for chaining")]
pub fn write_sheets(sheets: &[Sheet], author: &str) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    workbook.set_properties(&DocProperties::new().set_author(author));

    let bold_format = Format::new().set_bold();
    let percent_format = Format::new().set_num_format("0.00%");

    for sheet in sheets {
        let worksheet = workbook.add_worksheet().set_name(sheet.name())?;
        let percent_columns: Vec<bool> = sheet.header().iter().map(|name| is_percent_column(name)).collect();

        for (col, name) in sheet.header().iter().enumerate() {
            worksheet.write_string_with_format(0, column(col), name, &bold_format)?;
        }

        for (index, row) in sheet.rows().iter().enumerate() {
            let row_num = u32::try_from(index + 1).unwrap_or(u32::MAX);
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Empty => {}
                    Cell::Bool(b) => {
                        worksheet.write_boolean(row_num, column(col), *b)?;
                    }
                    Cell::Number(n) if percent_columns.get(col).copied().unwrap_or(false) => {
                        worksheet.write_number_with_format(row_num, column(col), *n, &percent_format)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row_num, column(col), *n)?;
                    }
                    Cell::Text(s) => {
                        worksheet.write_string(row_num, column(col), s)?;
                    }
                }
            }
        }

        if !sheet.header().is_empty() {
            worksheet.set_freeze_panes(1, 0)?;
        }

        worksheet.autofit();
    }

    workbook.save_to_buffer()
}

#[expect(clippy::cast_possible_truncation, reason = "Column index limited by Excel's u16 column limit")]
const fn column(index: usize) -> u16 {
    index as u16
}

/// Columns holding fractions that are shown as percentages.
fn is_percent_column(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case("CTR")
}

fn trim_trailing_empty(mut header: Vec<String>) -> Vec<String> {
    while header.last().is_some_and(|name| name.trim().is_empty()) {
        let _ = header.pop();
    }
    header
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Bool(b) => Cell::Bool(*b),
        Data::Int(i) => Cell::Number(int_to_f64(*i)),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => serial_to_date(dt.as_f64()).map_or_else(|| Cell::Number(dt.as_f64()), Cell::Text),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

#[expect(clippy::cast_precision_loss, reason = "spreadsheet numbers are f64")]
const fn int_to_f64(value: i64) -> f64 {
    value as f64
}

/// Renders an Excel date serial as `YYYY-MM-DD`.
fn serial_to_date(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    #[expect(clippy::cast_possible_truncation, reason = "date serials are small")]
    let days = serial.floor() as i64;
    epoch
        .checked_add_signed(TimeDelta::try_days(days)?)
        .map(|date| date.format("%Y-%m-%d").to_string())
}
