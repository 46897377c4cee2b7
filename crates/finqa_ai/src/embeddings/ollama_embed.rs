use std::time::Duration;

use finqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::OllamaClient;

// Chunks are small; anything longer is truncated before it reaches the model.
const MAX_INPUT_CHARS: usize = 8_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let input = match input.char_indices().nth(MAX_INPUT_CHARS) {
            Some((i, _)) => &input[..i],
            None => input,
        };
        let req = EmbedRequest {
            model: &self.model,
            input,
        };
        let resp: EmbedResponse = self.client.post_json(
            "/api/embed",
            &req,
            Duration::from_secs(15),
            "AI_EMBEDDINGS_FAILED",
        )?;
        match resp.embeddings.into_iter().next() {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(AppError::collaborator(
                "AI_EMBEDDINGS_FAILED",
                "Embeddings response was empty",
            )
            .with_details(format!("model={}", self.model))),
        }
    }
}
