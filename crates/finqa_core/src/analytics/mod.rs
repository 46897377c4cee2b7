use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One line of a trace log, read leniently: logs written by older runs or by hand
/// may lack any field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggedTrace {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub disclosure_mode: Option<String>,
    #[serde(default)]
    pub authorized: Option<bool>,
    #[serde(default)]
    pub grounded: Option<bool>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sources: Vec<LoggedSource>,
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ui: Option<String>,
    #[serde(default)]
    pub ts_utc: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggedSource {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl LoggedTrace {
    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn unique_source_pages(&self) -> usize {
        self.sources
            .iter()
            .map(|s| (s.source.as_deref(), s.page))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupStats {
    pub key: String,
    pub n: usize,
    pub grounded_rate: f64,
    pub latency_mean: Option<f64>,
    pub latency_median: Option<f64>,
    pub latency_p95: Option<f64>,
    pub sources_mean: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSummary {
    pub n_total: usize,
    pub n_ok: usize,
    pub n_error: usize,
    pub latency_ms_mean: Option<f64>,
    pub latency_ms_median: Option<f64>,
    pub latency_ms_p95: Option<f64>,
    pub grounded_rate: Option<f64>,
    pub avg_sources_count: Option<f64>,
    pub avg_unique_source_pages: Option<f64>,
    pub by_mode: Vec<GroupStats>,
    pub by_ui: Vec<GroupStats>,
}

pub fn read_trace_log(path: &Path) -> Result<Vec<LoggedTrace>, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::io("AUDIT_LOG_NOT_FOUND", "Failed to read trace log")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    parse_trace_log(&raw)
}

pub fn parse_trace_log(raw: &str) -> Result<Vec<LoggedTrace>, AppError> {
    let mut rows = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: LoggedTrace = serde_json::from_str(line).map_err(|e| {
            AppError::input("AUDIT_LOG_MALFORMED", "Trace log line is not a valid record")
                .with_details(format!("line={}; err={}", i + 1, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Linear-interpolation quantile over an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

fn sorted_latencies(rows: &[&LoggedTrace]) -> Vec<f64> {
    let mut v: Vec<f64> = rows.iter().filter_map(|r| r.latency_ms).collect();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

fn group_stats(rows: &[&LoggedTrace], key_of: impl Fn(&LoggedTrace) -> String) -> Vec<GroupStats> {
    let mut groups: BTreeMap<String, Vec<&LoggedTrace>> = BTreeMap::new();
    for r in rows.iter().copied() {
        groups.entry(key_of(r)).or_default().push(r);
    }
    let mut out: Vec<GroupStats> = groups
        .into_iter()
        .map(|(key, members)| {
            let lat = sorted_latencies(&members);
            GroupStats {
                n: members.len(),
                grounded_rate: mean(members.iter().map(|r| grounded_value(r))).unwrap_or(0.0),
                latency_mean: mean(lat.iter().copied()),
                latency_median: quantile(&lat, 0.5),
                latency_p95: quantile(&lat, 0.95),
                sources_mean: mean(members.iter().map(|r| r.sources.len() as f64)).unwrap_or(0.0),
                key,
            }
        })
        .collect();
    // Largest groups first; BTreeMap order breaks ties.
    out.sort_by(|a, b| b.n.cmp(&a.n));
    out
}

fn grounded_value(r: &LoggedTrace) -> f64 {
    if r.grounded.unwrap_or(false) {
        1.0
    } else {
        0.0
    }
}

/// Aggregate a trace log. Latency and groundedness figures cover successful
/// attempts only.
pub fn summarize(rows: &[LoggedTrace]) -> LogSummary {
    let ok: Vec<&LoggedTrace> = rows.iter().filter(|r| !r.has_error()).collect();
    let lat = sorted_latencies(&ok);

    LogSummary {
        n_total: rows.len(),
        n_ok: ok.len(),
        n_error: rows.len() - ok.len(),
        latency_ms_mean: mean(lat.iter().copied()),
        latency_ms_median: quantile(&lat, 0.5),
        latency_ms_p95: quantile(&lat, 0.95),
        grounded_rate: mean(ok.iter().map(|r| grounded_value(r))),
        avg_sources_count: mean(ok.iter().map(|r| r.sources.len() as f64)),
        avg_unique_source_pages: mean(ok.iter().map(|r| r.unique_source_pages() as f64)),
        by_mode: group_stats(&ok, |r| r.disclosure_mode.clone().unwrap_or_else(|| "unknown".to_string())),
        by_ui: group_stats(&ok, |r| r.ui.clone().unwrap_or_else(|| "unknown".to_string())),
    }
}

#[derive(Debug, Serialize)]
struct RowCsv<'a> {
    ts_utc: &'a str,
    question: &'a str,
    disclosure_mode: &'a str,
    ui: &'a str,
    authorized: Option<bool>,
    grounded: bool,
    latency_ms: Option<f64>,
    sources_count: usize,
    unique_source_pages: usize,
    has_error: bool,
    error: &'a str,
}

/// Write `summary.json`, `rows.csv`, `by_mode.csv` and `by_ui.csv` into `out_dir`.
pub fn write_report(rows: &[LoggedTrace], summary: &LogSummary, out_dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(out_dir).map_err(|e| {
        AppError::io("AUDIT_REPORT_FAILED", "Failed to create report directory")
            .with_details(format!("path={}; err={}", out_dir.display(), e))
    })?;

    let json = serde_json::to_string_pretty(summary).map_err(|e| {
        AppError::io("AUDIT_REPORT_FAILED", "Failed to encode summary").with_details(e.to_string())
    })?;
    let summary_path = out_dir.join("summary.json");
    fs::write(&summary_path, json).map_err(|e| {
        AppError::io("AUDIT_REPORT_FAILED", "Failed to write summary")
            .with_details(format!("path={}; err={}", summary_path.display(), e))
    })?;

    let mut w = csv_writer(&out_dir.join("rows.csv"))?;
    for r in rows {
        w.serialize(RowCsv {
            ts_utc: r.ts_utc.as_deref().unwrap_or(""),
            question: r.question.as_deref().unwrap_or(""),
            disclosure_mode: r.disclosure_mode.as_deref().unwrap_or(""),
            ui: r.ui.as_deref().unwrap_or(""),
            authorized: r.authorized,
            grounded: r.grounded.unwrap_or(false),
            latency_ms: r.latency_ms,
            sources_count: r.sources.len(),
            unique_source_pages: r.unique_source_pages(),
            has_error: r.has_error(),
            error: r.error.as_deref().unwrap_or(""),
        })
        .map_err(csv_err)?;
    }
    w.flush().map_err(|e| {
        AppError::io("AUDIT_REPORT_FAILED", "Failed to flush rows.csv").with_details(e.to_string())
    })?;

    for (name, groups) in [("by_mode.csv", &summary.by_mode), ("by_ui.csv", &summary.by_ui)] {
        let mut w = csv_writer(&out_dir.join(name))?;
        for g in groups.iter() {
            w.serialize(g).map_err(csv_err)?;
        }
        w.flush().map_err(|e| {
            AppError::io("AUDIT_REPORT_FAILED", "Failed to flush report table")
                .with_details(format!("file={name}; err={e}"))
        })?;
    }
    Ok(())
}

fn csv_writer(path: &Path) -> Result<csv::Writer<fs::File>, AppError> {
    csv::Writer::from_path(path).map_err(|e| {
        AppError::io("AUDIT_REPORT_FAILED", "Failed to create report table")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

fn csv_err(e: csv::Error) -> AppError {
    AppError::io("AUDIT_REPORT_FAILED", "Failed to write report row").with_details(e.to_string())
}
