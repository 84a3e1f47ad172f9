use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::domain::ContractRequest;
use tracing::info;

pub const DEFAULT_CHAT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";

/// Turns a free-form contract request into the requirement list that gets
/// programmed into the generated contract.
#[async_trait]
pub trait RequirementsExtractor: Send + Sync {
    async fn extract(&self, request: &ContractRequest, payment_amount: f64) -> Result<String>;
}

pub fn requirements_prompt(request: &ContractRequest, payment_amount: f64) -> String {
    format!(
        "Extract the requirements for a Solidity smart contract for an escrow service based on the following details:\n\n\
         Client Name: {}\nClient Email: {}\nPayment Amount: {:.2} ETH\nUser Requirements: {}\nDescription: {}",
        request.client_name,
        request.client_email,
        payment_amount,
        request.requirements,
        request.description
    )
}

#[derive(Debug, Clone)]
pub struct ChatCompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for ChatCompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHAT_COMPLETION_BASE_URL.into(),
            api_key: String::new(),
            model: DEFAULT_CHAT_COMPLETION_MODEL.into(),
        }
    }
}

/// Extractor backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionExtractor {
    http: Client,
    config: ChatCompletionConfig,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

impl ChatCompletionExtractor {
    pub fn new(config: ChatCompletionConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RequirementsExtractor for ChatCompletionExtractor {
    async fn extract(&self, request: &ContractRequest, payment_amount: f64) -> Result<String> {
        if self.config.api_key.trim().is_empty() {
            return Err(anyhow!("chat completion API key is not configured"));
        }

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: requirements_prompt(request, payment_amount),
            }],
        };

        let response: ChatCompletionResponse = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion endpoint rejected the request")?
            .json()
            .await
            .context("chat completion response was not valid JSON")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;

        info!(model = %self.config.model, "extracted contract requirements");
        Ok(content)
    }
}

#[cfg(test)]
#[path = "tests/extractor_tests.rs"]
mod tests;
