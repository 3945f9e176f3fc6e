// Selection Key - the date an export job filters on

use crate::domain::error::{DomainError, Result};
use chrono::NaiveDate;

/// Accepted input and token format (`dd-MM-yyyy`)
pub const SELECTION_DATE_FORMAT: &str = "%d-%m-%Y";

/// Validated selection key
///
/// Records match when their line starts with [`SelectionKey::token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionKey {
    raw: String,
    date: NaiveDate,
    token: String,
}

impl SelectionKey {
    /// Parse a caller-supplied date. Fails before any job exists.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let date = NaiveDate::parse_from_str(trimmed, SELECTION_DATE_FORMAT).map_err(|_| {
            DomainError::InvalidSelectionKey {
                key: raw.to_string(),
            }
        })?;

        Ok(Self {
            raw: trimmed.to_string(),
            date,
            token: date.format(SELECTION_DATE_FORMAT).to_string(),
        })
    }

    /// The key as the caller wrote it (trimmed)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Normalized prefix used for record matching
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn matches(&self, line: &str) -> bool {
        line.starts_with(&self.token)
    }
}

impl std::fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
