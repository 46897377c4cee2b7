use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use finqa_core::audit::JsonlTraceSink;
use finqa_core::domain::DisclosureMode;
use finqa_core::error::AppError;
use finqa_core::sensitive::PROXIMITY_WINDOW_CHARS;
use serde::{Deserialize, Serialize};

use crate::embeddings::ollama_embed::OllamaEmbedder;
use crate::index::VectorIndex;
use crate::llm::ollama_chat::OllamaChat;
use crate::ollama::OllamaClient;
use crate::qa::{AskRequest, AskSettings};

/// Runtime configuration, read from a JSON file. Every field has a default, so an
/// empty object is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct QaConfig {
    pub ollama_base_url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub generation_timeout_secs: u64,
    pub embed_model: String,
    pub sensitive_top_k: usize,
    pub general_top_k: usize,
    pub proximity_window: usize,
    pub default_mode: DisclosureMode,
    pub include_citations: bool,
    pub audit_log_path: PathBuf,
    pub index_dir: PathBuf,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://127.0.0.1:11434".to_string(),
            chat_model: "llama3.1:8b".to_string(),
            temperature: 0.2,
            generation_timeout_secs: 60,
            embed_model: "all-minilm".to_string(),
            sensitive_top_k: 12,
            general_top_k: 4,
            proximity_window: PROXIMITY_WINDOW_CHARS,
            default_mode: DisclosureMode::Authorized,
            include_citations: true,
            audit_log_path: PathBuf::from("logs/audit.jsonl"),
            index_dir: PathBuf::from("vectorstore"),
        }
    }
}

impl QaConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::io("CONFIG_READ_FAILED", "Failed to read config file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let cfg: QaConfig = serde_json::from_str(raw).map_err(|e| {
            AppError::input("CONFIG_INVALID", "Config is not valid").with_details(e.to_string())
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), AppError> {
        if let Err(e) = OllamaClient::new(&self.ollama_base_url) {
            let mut err = AppError::input("CONFIG_INVALID", e.message);
            err.details = e.details;
            return Err(err);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::input("CONFIG_INVALID", "temperature must be within 0..=2")
                .with_details(format!("temperature={}", self.temperature)));
        }
        if self.chat_model.trim().is_empty() || self.embed_model.trim().is_empty() {
            return Err(AppError::input("CONFIG_INVALID", "Model names must not be empty"));
        }
        if self.proximity_window == 0 {
            return Err(AppError::input("CONFIG_INVALID", "proximity_window must be positive"));
        }
        Ok(())
    }

    pub fn ask_settings(&self) -> AskSettings {
        AskSettings::new(self.sensitive_top_k, self.general_top_k, self.proximity_window)
    }

    /// Request template carrying the configured mode and citation default. Callers
    /// still decide `authorized` per request.
    pub fn request_template(&self) -> AskRequest {
        AskRequest::new(self.default_mode).with_citations(self.include_citations)
    }

    pub fn ollama_client(&self) -> Result<OllamaClient, AppError> {
        OllamaClient::new(&self.ollama_base_url)
    }

    pub fn generator(&self) -> Result<OllamaChat, AppError> {
        Ok(OllamaChat::new(self.ollama_client()?, &self.chat_model)
            .with_temperature(self.temperature)
            .with_timeout(Duration::from_secs(self.generation_timeout_secs.max(1))))
    }

    pub fn embedder(&self) -> Result<OllamaEmbedder, AppError> {
        Ok(OllamaEmbedder::new(self.ollama_client()?, &self.embed_model))
    }

    pub fn vector_index(&self) -> VectorIndex {
        VectorIndex::open(&self.index_dir)
    }

    pub fn open_audit_sink(&self) -> Result<JsonlTraceSink, AppError> {
        JsonlTraceSink::open(&self.audit_log_path)
    }
}
