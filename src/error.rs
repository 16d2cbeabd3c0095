//! Error types for the scraping APIs.

use thiserror::Error;

use crate::category::PageCategory;

/// Scraper errors.
///
/// Field absence caused by real-world race conditions (scratched horse,
/// unconfirmed draw, foreign race) is deliberately NOT an error: those
/// accessors return `Ok(None)` and log a warning instead. The variants here
/// cover caller mistakes and pages that depart from the known templates.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// Malformed identifier or argument at URL construction time.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Network/transport failure for one URL. Isolated to its batch slot.
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The page's required content table (or odds payload) was not found.
    #[error("expected table not found: {0}")]
    TableNotFound(String),

    /// Row index or horse number outside the valid range.
    #[error("index {index} out of range (rows: {len}). URL: {url}")]
    TableIndex {
        index: usize,
        len: usize,
        url: String,
    },

    /// The page handed to an extractor belongs to a different category.
    #[error("category mismatch: expected {expected}, got {actual}")]
    CategoryMismatch {
        expected: PageCategory,
        actual: PageCategory,
    },

    /// Page structure departs from the known template in a way that has no
    /// real-world reading (e.g. no date in the title).
    #[error("failed to parse {what}. URL: {url}")]
    Parse { what: String, url: String },
}

impl ScraperError {
    pub(crate) fn parse(what: impl Into<String>, url: impl Into<String>) -> Self {
        ScraperError::Parse {
            what: what.into(),
            url: url.into(),
        }
    }
}
