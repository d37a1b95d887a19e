//! Classifier request/response types
//!
//! Backend-agnostic; used across all classifier implementations.

use serde::{Deserialize, Serialize};

/// Everything the classifier gets to see about one transaction
///
/// `counterparty_purpose` and `recipient_note` are caller-supplied context
/// from the payment order; they often carry the decisive hint ("Skola",
/// "1. trieda") and are appended to the prompt when present.
#[derive(Debug, Clone, Default)]
pub struct ClassificationRequest {
    pub counterparty: String,
    pub description: String,
    /// Signed amount; the adapter is never invoked for credits
    pub amount: f64,
    pub counterparty_purpose: Option<String>,
    pub recipient_note: Option<String>,
}

/// A single best-category answer from the classifier
///
/// The name is free text from the model and must be validated against the
/// known category list before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
    /// Advisory score; models that omit it get the default
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

/// Confidence attached to classifier picks that don't report one
fn default_confidence() -> f64 {
    0.8
}
