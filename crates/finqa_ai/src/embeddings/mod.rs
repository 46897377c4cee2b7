use finqa_core::error::AppError;

/// Turns text into a vector. The index records `model()` so queries are embedded the
/// same way the chunks were.
pub trait Embedder {
    fn model(&self) -> &str;
    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError>;
}

pub mod ollama_embed;
