//! OpenAI-compatible classifier backend
//!
//! Works with any server that implements the OpenAI chat completions API:
//! a hosted service, or local stand-ins like vLLM and llama-server.
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Category;

use super::parsing::parse_category_suggestion;
use super::types::{CategorySuggestion, ClassificationRequest};
use super::AIBackend;

/// Upper bound on one classification round-trip. The call is advisory, so a
/// slow server degrades the pipeline to "uncategorized" instead of stalling it.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// OpenAI-compatible classifier backend
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        let mut backend = Self::new(base_url, model);
        backend.api_key = Some(api_key.to_string());
        backend
    }

    /// Create from environment variables
    ///
    /// Required: `OPENAI_COMPATIBLE_HOST`
    /// Optional: `OPENAI_COMPATIBLE_MODEL` (default: gpt-4o-mini)
    /// Optional: `OPENAI_COMPATIBLE_API_KEY`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OPENAI_COMPATIBLE_HOST").ok()?;
        let model =
            std::env::var("OPENAI_COMPATIBLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY").ok();

        let mut backend = Self::new(&host, &model);
        backend.api_key = api_key;
        Some(backend)
    }

    /// Make a chat completion request
    async fn chat_completion(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are an expert at categorizing financial transactions. \
                         Use every hint you are given, including the counterparty purpose \
                         and recipient note. Answer briefly and precisely."
                        .to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(0.1),
            max_tokens: Some(100),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidData(format!(
                "Classifier API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::InvalidData("No response from classifier API".into()))
    }
}

/// Build the classification prompt for one transaction
fn build_prompt(request: &ClassificationRequest, categories: &[Category]) -> String {
    let mut transaction_info = format!(
        "Transaction:\n- Counterparty: {}\n- Description: {}\n- Amount: {:.2} (expense)",
        request.counterparty, request.description, request.amount
    );
    if let Some(ref purpose) = request.counterparty_purpose {
        transaction_info.push_str(&format!("\n- Counterparty purpose: {}", purpose));
    }
    if let Some(ref note) = request.recipient_note {
        transaction_info.push_str(&format!("\n- Recipient note: {}", note));
    }

    let category_lines = categories
        .iter()
        .map(|c| match &c.icon {
            Some(icon) => format!("- {} {}", icon, c.name),
            None => format!("- {}", c.name),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Pick the most likely category for this transaction.\n\n{}\n\n\
         Available categories:\n{}\n\n\
         The counterparty purpose often carries the decisive hint about the \
         payment type. Answer with JSON only, using the category name without \
         its icon:\n{{\"category\": \"<name>\", \"confidence\": <0.0-1.0>}}",
        transaction_info, category_lines
    )
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// Chat completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

/// Chat response message
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn classify_transaction(
        &self,
        request: &ClassificationRequest,
        categories: &[Category],
    ) -> Result<CategorySuggestion> {
        let prompt = build_prompt(request, categories);
        let response = self.chat_completion(&prompt).await?;
        debug!("Classifier response: {}", response);

        parse_category_suggestion(&response)
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
