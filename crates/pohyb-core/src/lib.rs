//! pohyb Core Library
//!
//! Shared functionality for the pohyb bank-notification tracker:
//! - Field extraction from notification text (amount, date, counterparty,
//!   payment instrument, reference symbols)
//! - Database access and migrations
//! - Learned merchant-rule store with usage statistics
//! - Keyword heuristics for first-seen counterparties
//! - Pluggable classifier backends (OpenAI-compatible servers, mock)
//! - Categorization cascade with rule learning from corrections
//! - End-to-end notification processing pipeline

pub mod ai;
pub mod categorize;
pub mod db;
pub mod error;
pub mod extract;
pub mod keywords;
pub mod models;
pub mod pipeline;

pub use ai::{
    AIBackend, AIClient, CategorySuggestion, ClassificationRequest, MockBackend,
    OpenAICompatibleBackend,
};
pub use categorize::{normalize_counterparty, CategorizationContext, Categorizer};
pub use db::Database;
pub use error::{Error, ExtractionError, Result};
pub use extract::Extractor;
pub use keywords::{KeywordEntry, KeywordTable};
pub use pipeline::{BacklogResult, ProcessOutcome, Processor};
