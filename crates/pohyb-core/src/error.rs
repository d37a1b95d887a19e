//! Error types for pohyb

use thiserror::Error;

/// Why extraction could not produce a draft.
///
/// Extraction is all-or-nothing for the minimal viable fields: a notification
/// without a recoverable amount, date, or counterparty is rejected and the
/// caller must not persist anything for it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no amount-with-currency pattern found")]
    MissingAmount,

    #[error("no recognizable transaction date found")]
    MissingDate,

    #[error("no counterparty could be derived from the notification")]
    MissingCounterparty,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
