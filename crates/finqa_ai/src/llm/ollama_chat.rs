use std::time::Duration;

use finqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{user_message, Generator};
use crate::ollama::OllamaClient;

#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: OllamaClient,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OllamaChat {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

impl Generator for OllamaChat {
    fn generate(&self, system_instruction: &str, context: &str, question: &str) -> Result<String, AppError> {
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_instruction.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_message(context, question),
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        };

        let resp: ChatResponse =
            self.client
                .post_json("/api/chat", &req, self.timeout, "AI_GENERATION_FAILED")?;
        let text = resp.message.content.trim().to_string();
        if text.is_empty() {
            return Err(AppError::collaborator(
                "AI_GENERATION_FAILED",
                "Generation response was empty",
            )
            .with_details(format!("model={}", self.model)));
        }
        Ok(text)
    }
}
