use super::Sheet;
use camino::{Utf8Path, Utf8PathBuf};
use strum::Display;

/// Name of the empty sheet a newly created workbook starts with.
pub const PLACEHOLDER_SHEET: &str = "Sheet1";

/// Default sheet names of new documents. A blank sheet with one of these names is a placeholder.
const PLACEHOLDER_SHEET_NAMES: [&str; 2] = ["Sheet", PLACEHOLDER_SHEET];

/// Lifecycle of a workbook as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WorkbookState {
    /// Not yet persisted.
    NotExists,

    /// Persisted, but no sheet has a data row.
    ExistsEmpty,

    /// Persisted with at least one data row.
    ExistsWithData,
}

/// An in-memory spreadsheet document bound to the path it is persisted to.
#[derive(Debug, Clone)]
pub struct Workbook {
    path: Utf8PathBuf,
    sheets: Vec<Sheet>,
    persisted: bool,
}

impl Workbook {
    /// A workbook that does not exist on disk yet, holding only the placeholder sheet.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheets: vec![Sheet::new(PLACEHOLDER_SHEET, Vec::<String>::new())],
            persisted: false,
        }
    }

    pub(crate) fn loaded(path: impl Into<Utf8PathBuf>, sheets: Vec<Sheet>) -> Self {
        Self {
            path: path.into(),
            sheets,
            persisted: true,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    #[must_use]
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(Sheet::name)
    }

    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    /// Returns the named sheet, creating it with `header` as its first row if it does not exist.
    ///
    /// The header of an existing sheet is left untouched.
    pub fn get_or_create_sheet<S: AsRef<str>>(&mut self, name: &str, header: &[S]) -> &mut Sheet {
        let index = match self.sheets.iter().position(|s| s.name() == name) {
            Some(index) => index,
            None => {
                self.sheets.push(Sheet::new(name, header.iter().map(|h| h.as_ref())));
                self.sheets.len() - 1
            }
        };

        &mut self.sheets[index]
    }

    /// Removes blank placeholder sheets when some other sheet exists.
    ///
    /// Returns `true` if a placeholder was removed.
    pub fn prune_empty_default_sheet(&mut self) -> bool {
        if self.sheets.iter().all(is_placeholder) {
            return false;
        }

        let before = self.sheets.len();
        self.sheets.retain(|s| !is_placeholder(s));
        self.sheets.len() != before
    }

    #[must_use]
    pub fn state(&self) -> WorkbookState {
        if !self.persisted {
            WorkbookState::NotExists
        } else if self.sheets.iter().any(Sheet::has_data) {
            WorkbookState::ExistsWithData
        } else {
            WorkbookState::ExistsEmpty
        }
    }

    pub(crate) const fn mark_persisted(&mut self) {
        self.persisted = true;
    }
}

fn is_placeholder(sheet: &Sheet) -> bool {
    sheet.is_blank() && PLACEHOLDER_SHEET_NAMES.iter().any(|name| *name == sheet.name())
}
