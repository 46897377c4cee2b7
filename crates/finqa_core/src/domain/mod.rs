use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Text span produced by the external splitter. Identity is (source, page, offset).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub source: String,
    pub page: u32,
    /// Character offset of the span within its page.
    pub offset: u32,
    pub text: String,
}

impl Chunk {
    pub fn new(source: impl Into<String>, page: u32, offset: u32, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            page,
            offset,
            text: text.into(),
        }
    }

    /// Content-independent id derived from the chunk identity triple.
    pub fn chunk_id(&self) -> String {
        let payload = format!("source={}\npage={}\noffset={}", self.source, self.page, self.offset);
        hex::encode(Sha256::digest(payload.as_bytes()))
    }

    pub fn citation(&self) -> Citation {
        Citation {
            source: self.source.clone(),
            page: self.page,
        }
    }
}

/// A chunk as returned by one retrieval call. `rank` is 0-based, best first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedResult {
    pub chunk: Chunk,
    pub rank: u32,
    pub score: Option<f32>,
}

impl RetrievedResult {
    pub fn new(chunk: Chunk, rank: u32) -> Self {
        Self {
            chunk,
            rank,
            score: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn text(&self) -> &str {
        &self.chunk.text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Citation {
    pub source: String,
    pub page: u32,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (page {})", self.source, self.page)
    }
}

/// Distinct citations in first-seen order.
pub fn distinct_citations(results: &[RetrievedResult]) -> Vec<Citation> {
    let mut out: Vec<Citation> = Vec::new();
    for r in results {
        let c = r.chunk.citation();
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisclosureMode {
    /// Sensitive values always shown.
    Open,
    /// Shown only for authorized callers with a grounded answer.
    #[default]
    Authorized,
    /// Sensitive values always masked.
    Redacted,
}

impl DisclosureMode {
    pub const ALL: [DisclosureMode; 3] = [Self::Open, Self::Authorized, Self::Redacted];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Authorized => "authorized",
            Self::Redacted => "redacted",
        }
    }
}

impl fmt::Display for DisclosureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisclosureMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "authorized" => Ok(Self::Authorized),
            "redacted" => Ok(Self::Redacted),
            other => Err(AppError::input(
                "DISCLOSURE_MODE_INVALID",
                "Disclosure mode must be one of open|authorized|redacted",
            )
            .with_details(format!("value={other}"))),
        }
    }
}

/// Final outcome of one question. Built once, never mutated after return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerResult {
    pub text: String,
    pub citations: Vec<Citation>,
    pub grounded: bool,
    pub authorized: bool,
    pub disclosure_mode: DisclosureMode,
}
