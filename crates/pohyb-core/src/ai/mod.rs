//! Pluggable classifier backend abstraction
//!
//! The categorizer's last resort is an external natural-language classifier.
//! This module keeps it behind a backend-agnostic interface so the decision
//! pipeline never knows which server (or mock) is answering.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the classify/health interface
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, mock). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::{CategorySuggestion, ClassificationRequest};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Category;

/// Trait defining the interface for all classifier backends
///
/// Backends should be Send + Sync to allow use across async tasks. A failed
/// call is recoverable by design: callers degrade to "uncategorized" instead
/// of propagating.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Pick the best category name for one transaction
    ///
    /// `categories` is the current assignable list; the returned name still
    /// has to be validated against it by the caller. Must not be called for
    /// income transactions.
    async fn classify_transaction(
        &self,
        request: &ClassificationRequest,
        categories: &[Category],
    ) -> Result<CategorySuggestion>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete classifier client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Any server implementing the OpenAI chat-completions API
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create a classifier client from environment variables
    ///
    /// Returns None when the required variables are not set; the pipeline
    /// then simply runs without the classifier stage.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());

        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to openai_compatible");
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn classify_transaction(
        &self,
        request: &ClassificationRequest,
        categories: &[Category],
    ) -> Result<CategorySuggestion> {
        match self {
            AIClient::OpenAICompatible(b) => b.classify_transaction(request, categories).await,
            AIClient::Mock(b) => b.classify_transaction(request, categories).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
    }
}
