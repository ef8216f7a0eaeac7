use super::{Workbook, xlsx};
use crate::error::ReportError;
use crate::metrics::MetricRecord;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;
use strum::Display;

const LOG_TARGET: &str = "       store";

/// Default author property of saved workbooks.
pub const WORKBOOK_AUTHOR: &str = "seo-report";

/// Owns the spreadsheet documents of a report.
///
/// Every mutating operation opens its workbook from disk, applies the change, and saves before
/// returning, so a successful call always leaves its data on stable storage and a failure never
/// affects other workbooks.
#[derive(Debug, Clone)]
pub struct ReportStore {
    author: String,
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_author(WORKBOOK_AUTHOR)
    }

    /// A store whose saved workbooks carry `author` as their author property.
    #[must_use]
    pub fn with_author(author: impl Into<String>) -> Self {
        Self { author: author.into() }
    }

    /// Opens the workbook at `path`, or returns a new, unsaved one if no file exists there.
    pub fn open_or_create(&self, path: &Utf8Path) -> Result<Workbook, ReportError> {
        if !path.exists() {
            log::debug!(target: LOG_TARGET, "Workbook '{path}' does not exist yet, starting a new one");
            return Ok(Workbook::new(path));
        }

        let sheets = xlsx::read_sheets(path).map_err(|e| ReportError::persistence("open", path, e))?;
        Ok(Workbook::loaded(path, sheets))
    }

    /// Appends one record to the named sheet of the workbook at `path`, then saves.
    ///
    /// The sheet is created with the record kind's header if it does not exist yet.
    pub fn append_record(&self, path: &Utf8Path, sheet: &str, record: &MetricRecord) -> Result<(), ReportError> {
        let _ = self.append_records(path, sheet, record.kind().header(), core::slice::from_ref(record))?;
        Ok(())
    }

    /// Appends a batch of records to the named sheet of the workbook at `path`, then saves once.
    ///
    /// The sheet is created with `header` if it does not exist yet, even when `records` is empty.
    /// Rows are appended as-is: running the same input twice produces duplicate rows.
    pub fn append_records<S: AsRef<str>>(
        &self,
        path: &Utf8Path,
        sheet: &str,
        header: &[S],
        records: &[MetricRecord],
    ) -> Result<usize, ReportError> {
        let mut workbook = self.open_or_create(path)?;
        let target = workbook.get_or_create_sheet(sheet, header);
        for record in records {
            target.append_record(record)?;
        }

        self.save(&mut workbook)?;

        log::debug!(target: LOG_TARGET, "Appended {} row(s) to sheet '{sheet}' of '{path}'", records.len());
        Ok(records.len())
    }

    /// Copies every data row of a sheet in one workbook into a sheet of another workbook, then
    /// saves the destination.
    ///
    /// A destination sheet that does not exist is created with the source sheet's header. If
    /// the source workbook or sheet does not exist, the destination is left untouched.
    ///
    /// Returns the number of rows copied.
    pub fn copy_sheet(&self, source_path: &Utf8Path, source_sheet: &str, dest_path: &Utf8Path, dest_sheet: &str) -> Result<usize, ReportError> {
        self.transfer_rows(source_path, source_sheet, dest_path, dest_sheet, Transfer::Append)
    }

    /// Replaces the data rows of a sheet in another workbook with the rows of a source sheet,
    /// then saves the destination.
    ///
    /// The destination ends up holding exactly the source's rows, however often this runs.
    /// Missing sources and header mismatches fail as in [`Self::copy_sheet`].
    ///
    /// Returns the number of rows now in the destination sheet.
    pub fn mirror_sheet(&self, source_path: &Utf8Path, source_sheet: &str, dest_path: &Utf8Path, dest_sheet: &str) -> Result<usize, ReportError> {
        self.transfer_rows(source_path, source_sheet, dest_path, dest_sheet, Transfer::Replace)
    }

    fn transfer_rows(
        &self,
        source_path: &Utf8Path,
        source_sheet: &str,
        dest_path: &Utf8Path,
        dest_sheet: &str,
        transfer: Transfer,
    ) -> Result<usize, ReportError> {
        if !source_path.exists() {
            return Err(ReportError::SourceNotFound {
                path: source_path.to_path_buf(),
                sheet: None,
            });
        }

        let source = self.open_or_create(source_path)?;
        let source = source.sheet(source_sheet).ok_or_else(|| ReportError::SourceNotFound {
            path: source_path.to_path_buf(),
            sheet: Some(source_sheet.to_string()),
        })?;

        let mut dest = self.open_or_create(dest_path)?;
        let target = dest.get_or_create_sheet(dest_sheet, source.header());
        if !target.header_matches(source.header()) {
            return Err(ReportError::HeaderMismatch {
                path: dest_path.to_path_buf(),
                sheet: dest_sheet.to_string(),
                existing: target.header().to_vec(),
                incoming: source.header().to_vec(),
            });
        }

        if transfer == Transfer::Replace {
            target.clear_rows();
        }

        for row in source.rows() {
            target.push_row(row.clone())?;
        }

        self.save(&mut dest)?;

        log::debug!(
            target: LOG_TARGET,
            "{transfer} {} row(s) from '{source_path}' [{source_sheet}] to '{dest_path}' [{dest_sheet}]",
            source.row_count()
        );

        Ok(source.row_count())
    }

    /// Drops the placeholder sheet of the workbook at `path` if it is blank, then saves.
    pub fn finalize(&self, path: &Utf8Path) -> Result<(), ReportError> {
        let mut workbook = self.open_or_create(path)?;
        if workbook.prune_empty_default_sheet() {
            log::debug!(target: LOG_TARGET, "Removed empty placeholder sheet from '{path}'");
        }

        self.save(&mut workbook)
    }

    /// Persists `workbook` to its path.
    ///
    /// The document is written to a sibling temporary file which is synced and then renamed over
    /// the target, so readers never observe a partially written workbook. A blank placeholder
    /// sheet is dropped first whenever another sheet exists.
    pub fn save(&self, workbook: &mut Workbook) -> Result<(), ReportError> {
        let _ = workbook.prune_empty_default_sheet();

        let path = workbook.path().to_path_buf();
        let bytes = xlsx::write_sheets(workbook.sheets(), &self.author).map_err(|e| ReportError::persistence("encode", &path, e))?;

        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ReportError::persistence("create directory for", &path, e))?;
        }

        let temp_path = temp_path_for(&path);
        let result = write_synced(&temp_path, &bytes).and_then(|()| fs::rename(&temp_path, &path));
        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(ReportError::persistence("save", path, e));
        }

        workbook.mark_persisted();
        log::trace!(target: LOG_TARGET, "Saved '{path}'");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
enum Transfer {
    #[strum(to_string = "Copied")]
    Append,

    #[strum(to_string = "Mirrored")]
    Replace,
}

fn temp_path_for(path: &Utf8Path) -> Utf8PathBuf {
    let file_name = path.file_name().unwrap_or("workbook.xlsx");
    path.with_file_name(format!(".{file_name}.tmp"))
}

fn write_synced(path: &Utf8Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metrics::{BrokenLinkRecord, IndexedPageSnapshot, MetricKind};
    use crate::store::{Cell, PLACEHOLDER_SHEET, WorkbookState};

    fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
    }

    fn indexed(count: u64) -> MetricRecord {
        IndexedPageSnapshot {
            last_updated: Some("3/4/24".into()),
            indexed_count: count,
        }
        .into()
    }

    fn broken(url: &str) -> MetricRecord {
        BrokenLinkRecord {
            url: url.into(),
            last_crawled: Some("2024-03-01".into()),
        }
        .into()
    }

    #[test]
    fn test_open_or_create_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new();
        let wb = store.open_or_create(&temp_path(&dir, "missing.xlsx")).unwrap();
        assert_eq!(wb.state(), WorkbookState::NotExists);
        assert!(!dir.path().join("missing.xlsx").exists());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_append_record_creates_workbook_with_header_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "Indexed_Pages.xlsx");
        let store = ReportStore::new();

        store.append_record(&path, "Indexed Data", &indexed(12_345)).unwrap();

        let wb = store.open_or_create(&path).unwrap();
        assert_eq!(wb.state(), WorkbookState::ExistsWithData);
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), ["Indexed Data"]);

        let sheet = wb.sheet("Indexed Data").unwrap();
        assert_eq!(sheet.header(), MetricKind::IndexedPages.header());
        assert_eq!(sheet.rows(), [vec![Cell::from("3/4/24"), Cell::Number(12_345.0)]]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_append_is_not_an_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "Indexed_Pages.xlsx");
        let store = ReportStore::new();

        store.append_record(&path, "Indexed Data", &indexed(7)).unwrap();
        store.append_record(&path, "Indexed Data", &indexed(7)).unwrap();

        let wb = store.open_or_create(&path).unwrap();
        assert_eq!(wb.sheet("Indexed Data").unwrap().row_count(), 2);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_append_records_creates_sheet_for_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        let count = store.append_records(&path, "404s", MetricKind::BrokenLinks.header(), &[]).unwrap();
        assert_eq!(count, 0);

        let wb = store.open_or_create(&path).unwrap();
        assert_eq!(wb.state(), WorkbookState::ExistsEmpty);
        assert_eq!(wb.sheet("404s").unwrap().header(), ["URL", "Last Crawled"]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_append_rejects_record_of_other_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        let _ = store
            .append_records(&path, "404s", MetricKind::BrokenLinks.header(), &[broken("https://example.com/a")])
            .unwrap();

        let err = store
            .append_records(&path, "404s", MetricKind::QueryPerformance.header(), &[MetricRecord::from(
                crate::metrics::QueryPerformanceRow {
                    query: "q".into(),
                    clicks: 1,
                    impressions: 1,
                    ctr: 1.0,
                    position: 1.0,
                },
            )])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArityMismatch);

        let wb = store.open_or_create(&path).unwrap();
        assert_eq!(wb.sheet("404s").unwrap().row_count(), 1);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_copy_sheet_into_new_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = temp_path(&dir, "Indexed_Pages.xlsx");
        let dest = temp_path(&dir, "Monthly_SEO_Metrics.xlsx");
        let store = ReportStore::new();

        let records = [indexed(1), indexed(2), indexed(3)];
        let _ = store
            .append_records(&source, "Indexed Data", MetricKind::IndexedPages.header(), &records)
            .unwrap();

        let copied = store.copy_sheet(&source, "Indexed Data", &dest, "Indexed Pages").unwrap();
        assert_eq!(copied, 3);

        let wb = store.open_or_create(&dest).unwrap();
        let sheet = wb.sheet("Indexed Pages").unwrap();
        assert_eq!(sheet.header(), MetricKind::IndexedPages.header());
        assert_eq!(sheet.row_count(), 3);
        assert!(wb.sheet(PLACEHOLDER_SHEET).is_none());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_copy_sheet_appends_to_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = temp_path(&dir, "Total_Clicks.xlsx");
        let dest = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        let record = MetricRecord::from(crate::metrics::TotalClicksSnapshot {
            date: "10/19/26".into(),
            total_clicks: 5,
        });
        store.append_record(&source, "Total Clicks", &record).unwrap();

        let _ = store.copy_sheet(&source, "Total Clicks", &dest, "Total Clicks Last 3 Months").unwrap();
        let _ = store.copy_sheet(&source, "Total Clicks", &dest, "Total Clicks Last 3 Months").unwrap();

        let wb = store.open_or_create(&dest).unwrap();
        assert_eq!(wb.sheet("Total Clicks Last 3 Months").unwrap().row_count(), 2);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_mirror_sheet_replaces_destination_rows() {
        let dir = tempfile::tempdir().unwrap();
        let source = temp_path(&dir, "Indexed_Pages.xlsx");
        let dest = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        store.append_record(&source, "Indexed Data", &indexed(1)).unwrap();
        store.append_record(&dest, "404s", &broken("https://example.com/a")).unwrap();

        for expected in 1..=3 {
            assert_eq!(store.mirror_sheet(&source, "Indexed Data", &dest, "Indexed Pages").unwrap(), expected);
            if expected < 3 {
                store.append_record(&source, "Indexed Data", &indexed(u64::try_from(expected + 1).unwrap())).unwrap();
            }
        }

        let wb = store.open_or_create(&dest).unwrap();
        let sheet = wb.sheet("Indexed Pages").unwrap();
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.rows()[2][1], Cell::Number(3.0));
        assert_eq!(wb.sheet("404s").unwrap().row_count(), 1);

        let _ = store.mirror_sheet(&source, "Indexed Data", &dest, "Indexed Pages").unwrap();
        let wb = store.open_or_create(&dest).unwrap();
        assert_eq!(wb.sheet("Indexed Pages").unwrap().row_count(), 3);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_mirror_sheet_rejects_header_mismatch_without_clearing() {
        let dir = tempfile::tempdir().unwrap();
        let source = temp_path(&dir, "Indexed_Pages.xlsx");
        let dest = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        store.append_record(&source, "Indexed Data", &indexed(1)).unwrap();
        store.append_record(&dest, "Indexed Pages", &broken("https://example.com/a")).unwrap();

        let err = store.mirror_sheet(&source, "Indexed Data", &dest, "Indexed Pages").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HeaderMismatch);

        let wb = store.open_or_create(&dest).unwrap();
        assert_eq!(wb.sheet("Indexed Pages").unwrap().row_count(), 1);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_copy_sheet_missing_source_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = temp_path(&dir, "Indexed_Pages.xlsx");
        let dest = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        let err = store.copy_sheet(&source, "Indexed Data", &dest, "Indexed Pages").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
        assert!(!dest.exists());

        store.append_record(&dest, "404s", &broken("https://example.com/a")).unwrap();
        let before = fs::read(&dest).unwrap();

        store.append_record(&source, "Other", &indexed(1)).unwrap();
        let err = store.copy_sheet(&source, "Indexed Data", &dest, "Indexed Pages").unwrap_err();
        assert!(matches!(err, ReportError::SourceNotFound { sheet: Some(_), .. }));
        assert_eq!(fs::read(&dest).unwrap(), before);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_copy_sheet_rejects_header_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let source = temp_path(&dir, "Indexed_Pages.xlsx");
        let dest = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        store.append_record(&source, "Indexed Data", &indexed(1)).unwrap();
        store.append_record(&dest, "Indexed Pages", &broken("https://example.com/a")).unwrap();

        let err = store.copy_sheet(&source, "Indexed Data", &dest, "Indexed Pages").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HeaderMismatch);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_open_corrupt_workbook_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "corrupt.xlsx");
        fs::write(&path, b"definitely not a zip archive").unwrap();

        let err = ReportStore::new().append_record(&path, "Indexed Data", &indexed(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersistenceError);
        assert!(err.to_string().contains("corrupt.xlsx"), "{err}");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_save_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        store.append_record(&path, "404s", &broken("https://example.com/a")).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["report.xlsx"]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_finalize_drops_blank_sheet_of_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "Monthly_SEO_Metrics.xlsx");
        let sheets = [
            crate::store::Sheet::new("Sheet", Vec::<String>::new()),
            crate::store::Sheet::new("404s", MetricKind::BrokenLinks.header().iter().copied()),
        ];
        fs::write(&path, xlsx::write_sheets(&sheets, "tests").unwrap()).unwrap();

        let store = ReportStore::new();
        store.finalize(&path).unwrap();

        let wb = store.open_or_create(&path).unwrap();
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), ["404s"]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call zlib functions")]
    fn test_finalize_new_workbook_keeps_placeholder_when_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir, "report.xlsx");
        let store = ReportStore::new();

        store.finalize(&path).unwrap();

        let wb = store.open_or_create(&path).unwrap();
        assert_eq!(wb.state(), WorkbookState::ExistsEmpty);
        assert_eq!(wb.sheet_names().collect::<Vec<_>>(), [PLACEHOLDER_SHEET]);
    }
}
