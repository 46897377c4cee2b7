use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::{Citation, DisclosureMode, RetrievedResult};
use crate::error::AppError;

/// Caller-supplied run tags copied into every trace of a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceContext {
    pub ui: Option<String>,
    pub question_index: Option<u32>,
    pub questions_file: Option<String>,
}

impl TraceContext {
    pub fn ui(ui: impl Into<String>) -> Self {
        Self {
            ui: Some(ui.into()),
            ..Self::default()
        }
    }
}

/// One audit entry per answer attempt, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceRecord {
    pub question: String,
    pub disclosure_mode: DisclosureMode,
    pub authorized: bool,
    pub grounded: bool,
    /// Every retrieved (source, page), duplicates kept.
    pub sources: Vec<Citation>,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_file: Option<String>,
}

/// Inputs of one answer attempt, as the orchestrator saw them.
#[derive(Debug, Clone)]
pub struct TraceInput<'a> {
    pub question: &'a str,
    pub mode: DisclosureMode,
    pub authorized: bool,
    pub grounded: bool,
    pub retrieved: &'a [RetrievedResult],
    pub latency_ms: f64,
    pub error: Option<&'a AppError>,
    pub context: &'a TraceContext,
}

pub fn build_trace(input: TraceInput<'_>) -> TraceRecord {
    // A failed attempt never counts as grounded and reports no sources.
    let failed = input.error.is_some();
    TraceRecord {
        question: input.question.to_string(),
        disclosure_mode: input.mode,
        authorized: input.authorized,
        grounded: input.grounded && !failed,
        sources: if failed {
            Vec::new()
        } else {
            input.retrieved.iter().map(|r| r.chunk.citation()).collect()
        },
        latency_ms: input.latency_ms,
        error: input.error.map(|e| e.to_string()),
        ui: input.context.ui.clone(),
        question_index: input.context.question_index,
        questions_file: input.context.questions_file.clone(),
    }
}

/// Append-only destination for trace records. Shared across concurrent `ask` calls.
pub trait TraceSink: Send + Sync {
    fn record(&self, trace: &TraceRecord) -> Result<(), AppError>;
}

/// Collects records in memory; used by tests and embedders that forward traces.
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    records: Mutex<Vec<TraceRecord>>,
}

impl MemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        match self.records.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TraceSink for MemoryTraceSink {
    fn record(&self, trace: &TraceRecord) -> Result<(), AppError> {
        let mut g = self.records.lock().map_err(|_| {
            AppError::io("AUDIT_WRITE_FAILED", "Trace buffer lock poisoned")
        })?;
        g.push(trace.clone());
        Ok(())
    }
}

#[derive(Serialize)]
struct StampedTrace<'a> {
    #[serde(flatten)]
    trace: &'a TraceRecord,
    ts_utc: String,
}

/// JSON-lines file sink. Each record becomes exactly one line stamped with `ts_utc`.
#[derive(Debug)]
pub struct JsonlTraceSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlTraceSink {
    /// Creates the parent directory; the file itself is created on first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::io("AUDIT_OPEN_FAILED", "Failed to create audit log directory")
                    .with_details(format!("path={}; err={}", parent.display(), e))
            })?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceSink for JsonlTraceSink {
    fn record(&self, trace: &TraceRecord) -> Result<(), AppError> {
        let stamped = StampedTrace {
            trace,
            ts_utc: now_rfc3339_utc()?,
        };
        let mut line = serde_json::to_string(&stamped).map_err(|e| {
            AppError::io("AUDIT_WRITE_FAILED", "Failed to encode trace record")
                .with_details(e.to_string())
        })?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::io("AUDIT_WRITE_FAILED", "Audit log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::io("AUDIT_WRITE_FAILED", "Failed to open audit log")
                    .with_details(format!("path={}; err={}", self.path.display(), e))
            })?;
        // Single write per line so readers never observe a partial record.
        file.write_all(line.as_bytes()).map_err(|e| {
            AppError::io("AUDIT_WRITE_FAILED", "Failed to append trace record")
                .with_details(format!("path={}; err={}", self.path.display(), e))
        })
    }
}

pub fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
        AppError::io("AUDIT_TIME_FAILED", "Failed to format time").with_details(e.to_string())
    })
}
