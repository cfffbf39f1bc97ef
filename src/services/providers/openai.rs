/// OpenAI chat-completion provider
///
/// Builds a chat-style prompt from the query and the preference sliders,
/// issues one HTTPS POST, and parses the JSON product payload embedded in
/// the model's reply. The bearer credential is checked before anything is
/// sent: a request must never go out with an empty key.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{ProductSuggestion, UserPreferences},
    services::providers::RecommendationProvider,
};

const MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 150;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = r#"You are a product recommendation assistant.
Respond **only** with JSON in this format:
{"name": "Product Name", "price": 29.99, "summary": "Description", "imageURL": "https://image.com", "affiliateLink": "https://link.com"}
use budget sensitivity to stay close to the range requested on a sliding scale from 0-1
use brand loyalty to suggest well known brands on a sliding scale from 0-1"#;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl OpenAiProvider {
    /// Creates a provider. The credential is checked per call, so a missing
    /// key fails each fetch before any request is sent.
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for OpenAiProvider {
    async fn fetch(
        &self,
        query: &str,
        preferences: &UserPreferences,
    ) -> AppResult<ProductSuggestion> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
        }

        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AppError::MissingCredential)?;

        let user_prompt = build_user_prompt(query, preferences);
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(response = %body, "Raw chat-completion response");

        let content = extract_message_content(&body)?;
        let product = parse_product(&content)?;

        tracing::info!(
            query = %query,
            product = %product.name,
            provider = self.name(),
            "Recommendation fetched"
        );

        Ok(product)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn map_transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout
    } else {
        AppError::HttpClient(err)
    }
}

/// Formats the user message: the free-text query plus both preference
/// sliders as decimals.
fn build_user_prompt(query: &str, preferences: &UserPreferences) -> String {
    format!(
        "Query: {}, Budget: {}, Brand Loyalty: {}",
        query, preferences.budget_sensitivity, preferences.brand_loyalty
    )
}

/// Pulls the first choice's message content out of the completion envelope.
fn extract_message_content(body: &str) -> AppResult<String> {
    let envelope: ChatResponse = serde_json::from_str(body)
        .map_err(|e| AppError::InvalidResponse(format!("malformed completion envelope: {}", e)))?;

    envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            AppError::InvalidResponse("completion contained no message content".to_string())
        })
}

/// Parses the message content strictly as the five-field product object.
/// The price must be a non-negative finite number; nothing else is
/// range-checked.
fn parse_product(content: &str) -> AppResult<ProductSuggestion> {
    let payload = strip_json_fences(content);

    let product: ProductSuggestion =
        serde_json::from_str(payload).map_err(|e| AppError::Decode(e.to_string()))?;

    if product.name.trim().is_empty() {
        return Err(AppError::Decode("product name is empty".to_string()));
    }
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(AppError::Decode(format!(
            "price {} is not a non-negative number",
            product.price
        )));
    }

    Ok(product)
}

/// Strips the markdown code fences some models wrap around JSON output.
fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let opened = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(str::trim_start);

    match opened {
        Some(inner) => inner.strip_suffix("```").map(str::trim_end).unwrap_or(inner),
        None => trimmed,
    }
}
