use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad failure category. Decides how a caller should react, not what went wrong.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Index/store or adapter not initialised. Re-initialise before retrying.
    Precondition,
    /// Retrieval, generation or embedding collaborator failed.
    #[default]
    Collaborator,
    /// Caller-supplied data could not be used (bad config, malformed log line, ...).
    Input,
    /// Local filesystem failure (audit log, index files, reports).
    Io,
}

/// Single structured error shape shared by the core and the collaborator adapters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
    #[serde(default)]
    pub class: ErrorClass,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
            class: ErrorClass::default(),
        }
    }

    /// Fatal readiness failure; never retryable.
    pub fn precondition(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message).with_class(ErrorClass::Precondition)
    }

    pub fn collaborator(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message).with_class(ErrorClass::Collaborator)
    }

    pub fn input(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message).with_class(ErrorClass::Input)
    }

    pub fn io(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message).with_class(ErrorClass::Io)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_class(mut self, class: ErrorClass) -> Self {
        self.class = class;
        self
    }

    pub fn is_precondition(&self) -> bool {
        self.class == ErrorClass::Precondition
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
