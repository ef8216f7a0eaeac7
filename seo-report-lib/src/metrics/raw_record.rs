use crate::store::Cell;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A loosely-typed record as produced by a page extractor or read from an export row.
///
/// Field lookups ignore ASCII case, since the dashboard and its exports disagree on
/// capitalization (`Last crawled` vs `Last Crawled`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, Cell>,
}

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from an export row, keyed by the export's header row.
    ///
    /// Header cells that are empty are skipped, as are row cells beyond the header's width.
    #[must_use]
    pub fn from_row(header: &[Cell], row: &[Cell]) -> Self {
        header
            .iter()
            .zip(row.iter().chain(core::iter::repeat(&Cell::Empty)))
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Cell>) {
        let _ = self.fields.insert(field.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.fields
            .get(field)
            .or_else(|| self.fields.iter().find(|(name, _)| name.eq_ignore_ascii_case(field)).map(|(_, value)| value))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Cell::is_empty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl<K: Into<String>, V: Into<Cell>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
