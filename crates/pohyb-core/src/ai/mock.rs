//! Mock classifier backend for testing
//!
//! Deterministic responses keyed on well-known Slovak merchants, plus a
//! failing variant for exercising the degradation path without a server.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Category;

use super::types::{CategorySuggestion, ClassificationRequest};
use super::AIBackend;

/// Mock classifier backend
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// When set, every call fails (simulates timeout/rate limit)
    fail: bool,
    /// Fixed response overriding the keyword mapping
    suggestion: Option<CategorySuggestion>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            fail: false,
            suggestion: None,
        }
    }

    /// Create a backend whose every classification call fails
    pub fn failing() -> Self {
        Self {
            healthy: false,
            fail: true,
            suggestion: None,
        }
    }

    /// Create a backend that always returns the given suggestion
    pub fn with_suggestion(category: &str, confidence: f64) -> Self {
        Self {
            healthy: true,
            fail: false,
            suggestion: Some(CategorySuggestion {
                category: category.to_string(),
                confidence,
            }),
        }
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn classify_transaction(
        &self,
        request: &ClassificationRequest,
        _categories: &[Category],
    ) -> Result<CategorySuggestion> {
        if self.fail {
            return Err(Error::InvalidData("mock classifier failure".into()));
        }

        if let Some(ref suggestion) = self.suggestion {
            return Ok(suggestion.clone());
        }

        // Keyword mapping over well-known merchants
        let combined = format!("{} {}", request.counterparty, request.description).to_uppercase();
        let (category, confidence) = if combined.contains("BOLT") || combined.contains("UBER") {
            ("Doprava", 0.95)
        } else if combined.contains("TESCO")
            || combined.contains("KAUFLAND")
            || combined.contains("BILLA")
            || combined.contains("LIDL")
        {
            ("Potraviny", 0.95)
        } else if combined.contains("MCDONALD") || combined.contains("KFC") {
            ("Reštaurácie", 0.9)
        } else if combined.contains("SHELL") || combined.contains("OMV") {
            ("Pohonné hmoty", 0.9)
        } else {
            ("Iné", 0.4)
        };

        Ok(CategorySuggestion {
            category: category.to_string(),
            confidence,
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
