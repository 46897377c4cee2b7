use finqa_core::error::AppError;

/// Text-generation collaborator. A black box: failures surface as errors.
pub trait Generator {
    fn generate(&self, system_instruction: &str, context: &str, question: &str) -> Result<String, AppError>;
}

pub mod ollama_chat;

/// User turn handed to the model: retrieved context first, then the question.
pub fn user_message(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion:\n{question}")
}
