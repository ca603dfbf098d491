use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed system instruction for every chat completion.
pub const SYSTEM_PROMPT: &str = "You are a medical assistant. Answer questions accurately based ONLY on the patient data provided. Be concise and professional. If information is not available in the data, say so clearly.";

/// Chat completion backend. One call per answer, no retries.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Client for Groq's OpenAI-compatible chat completion endpoint.
#[derive(Clone)]
pub struct GroqClient {
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

impl GroqClient {
    pub fn new(
        base_url: String,
        model: String,
        api_key: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            base_url,
            model,
            api_key,
            temperature,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    pub fn default(api_key: String) -> Self {
        Self::new(
            "https://api.groq.com".to_string(),
            "openai/gpt-oss-120b".to_string(),
            api_key,
            0.0,
            1024,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionModel for GroqClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/openai/v1/chat/completions", self.base_url);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, prompt_chars = user_prompt.len(), "Requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send completion request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Completion request failed ({}): {}", status, error_text);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse completion response")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Completion response held no choices")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_both_messages() {
        let request = ChatCompletionRequest {
            model: "openai/gpt-oss-120b".to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: "What diseases does P001 have?".to_string(),
                },
            ],
            temperature: 0.0,
            max_tokens: 1024,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "openai/gpt-oss-120b");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn response_parsing_takes_the_first_choice() {
        let raw = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "The patient has hypertension."}}
            ]
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content,
            "The patient has hypertension."
        );
    }
}
