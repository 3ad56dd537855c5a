use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use std::error::Error as StdError;

use super::openai::{bearer_client, OpenAIChatRequest, OpenAIResponse};
use super::{to_wire_messages, ChatClient, CompletionResponse};
use crate::llm::{endpoint, LlmConfig};
use crate::models::chat::ChatMessage;

const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_BASE_URL: &str = "https://api.groq.com";
// Groq serves the OpenAI chat schema under its own prefix.
const CHAT_ROUTE: &str = "/openai/v1/chat/completions";

pub struct GroqChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            http: bearer_client(&api_key)?,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| "Groq API key is required".to_string())?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = endpoint(&self.base_url, CHAT_ROUTE)?;
        let req = OpenAIChatRequest {
            model: &self.model,
            messages: to_wire_messages(messages),
            temperature,
        };
        debug!("Groq request to {} with {} messages", url, req.messages.len());

        let resp = self.http.post(&url)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json::<OpenAIResponse>()
            .await?;

        Ok(CompletionResponse { response: resp.into_first_content("Groq")? })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
