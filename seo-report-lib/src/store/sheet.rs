use super::Cell;
use crate::error::ReportError;
use crate::metrics::MetricRecord;

/// A named table: one header row followed by data rows of the same width.
///
/// The header is fixed when the sheet is created and never rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    #[must_use]
    pub fn new(name: impl Into<String>, header: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Rebuilds a sheet read back from disk, padding or trimming rows to the header's width.
    pub(crate) fn from_parts(name: String, header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = header.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self { name, header, rows }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Header names as cells, for keying rows read from an export.
    #[must_use]
    pub fn header_cells(&self) -> Vec<Cell> {
        self.header.iter().map(|name| Cell::from(name.as_str())).collect()
    }

    /// Data rows, excluding the header.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }

    /// A sheet with neither a header nor rows, such as the placeholder of a new workbook.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    /// Whether `header` names the same columns, in the same order, as this sheet's header.
    #[must_use]
    pub fn header_matches<S: AsRef<str>>(&self, header: &[S]) -> bool {
        self.header.len() == header.len() && self.header.iter().zip(header).all(|(a, b)| a == b.as_ref())
    }

    /// Appends one row; the row must be exactly as wide as the header.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), ReportError> {
        if row.len() != self.header.len() {
            return Err(ReportError::ArityMismatch {
                sheet: self.name.clone(),
                expected: self.header.len(),
                actual: row.len(),
            });
        }

        self.rows.push(row);
        Ok(())
    }

    /// Drops every data row, keeping the header.
    pub(crate) fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// Appends a row built from `record`'s fields in header order.
    pub fn append_record(&mut self, record: &MetricRecord) -> Result<(), ReportError> {
        self.push_row(record.to_row())
    }
}
