use strum::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ParseFailure {
    #[strum(to_string = "is missing")]
    Missing,

    #[strum(to_string = "is not a number")]
    NotANumber,

    #[strum(to_string = "is negative")]
    Negative,

    #[strum(to_string = "is not a valid URL")]
    InvalidUrl,
}

/// A single field that failed validation or normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}': '{value}' {failure}")]
pub struct ParseError {
    pub field: String,
    pub value: String,
    pub failure: ParseFailure,
}

impl ParseError {
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<String>, failure: ParseFailure) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            failure,
        }
    }

    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "", ParseFailure::Missing)
    }
}
