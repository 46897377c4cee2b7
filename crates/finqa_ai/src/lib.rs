pub mod config;
pub mod embeddings;
pub mod eval;
pub mod index;
pub mod llm;
pub mod ollama;
pub mod qa;
pub mod retrieve;

#[cfg(test)]
mod tests {
    use super::ollama::OllamaClient;

    #[test]
    fn enforces_localhost_only_base_url() {
        assert!(OllamaClient::new("http://127.0.0.1:11434").is_ok());
        assert!(OllamaClient::new("http://127.0.0.1").is_ok());
        assert!(OllamaClient::new("http://127.0.0.1:11434/").is_ok());

        assert!(OllamaClient::new("http://localhost:11434").is_err());
        assert!(OllamaClient::new("http://0.0.0.0:11434").is_err());
        assert!(OllamaClient::new("https://example.com").is_err());

        assert!(OllamaClient::new("http://127.0.0.1.evil.com:11434").is_err());
        assert!(OllamaClient::new("http://127.0.0.1@evil.com:11434").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:0").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:99999").is_err());
        assert!(OllamaClient::new("http://127.0.0.1:11434/api").is_err());
    }

    #[test]
    fn rejected_url_is_an_input_error() {
        let err = OllamaClient::new("http://10.0.0.5:11434").unwrap_err();
        assert_eq!(err.code, "AI_REMOTE_NOT_ALLOWED");
        assert_eq!(err.class, finqa_core::error::ErrorClass::Input);
    }
}
