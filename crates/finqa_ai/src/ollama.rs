use std::time::Duration;

use finqa_core::error::AppError;

const LOOPBACK: &str = "http://127.0.0.1";

/// Connection to a local Ollama server. Retrieved document text contains PII, so
/// requests are restricted to the IPv4 loopback address.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let rest = base_url.strip_prefix(LOOPBACK).ok_or_else(|| remote_rejected(&base_url))?;

        if !rest.is_empty() {
            let port = rest.strip_prefix(':').ok_or_else(|| remote_rejected(&base_url))?;
            let valid = !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && port.parse::<u16>().is_ok_and(|p| p != 0);
            if !valid {
                return Err(remote_rejected(&base_url));
            }
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url).timeout(Duration::from_millis(800)).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::collaborator("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(ureq::Error::Status(status, _)) => Err(AppError::collaborator(
                "AI_OLLAMA_UNHEALTHY",
                "Ollama health check failed",
            )
            .with_details(format!("status={status}"))),
            Err(e) => Err(AppError::collaborator(
                "AI_OLLAMA_UNREACHABLE",
                "Failed to reach Ollama on 127.0.0.1",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }

    /// POST a JSON body and decode a JSON reply. `code` tags every failure.
    pub(crate) fn post_json<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        timeout: Duration,
        code: &str,
    ) -> Result<Resp, AppError>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let payload = serde_json::to_value(body).map_err(|e| {
            AppError::collaborator(code, "Failed to encode Ollama request").with_details(e.to_string())
        })?;

        match ureq::post(&url).timeout(timeout).send_json(payload) {
            Ok(r) if r.status() == 200 => r.into_json::<Resp>().map_err(|e| {
                AppError::collaborator(code, "Failed to decode Ollama response")
                    .with_details(e.to_string())
            }),
            Ok(r) => Err(AppError::collaborator(code, "Ollama request failed")
                .with_details(format!("path={path}; status={}", r.status()))),
            // The server answered; repeating the same request gets the same status.
            Err(ureq::Error::Status(status, _)) => Err(AppError::collaborator(
                code,
                "Ollama request failed",
            )
            .with_details(format!("path={path}; status={status}"))),
            Err(e) => Err(AppError::collaborator(code, "Failed to call Ollama")
                .with_details(format!("path={path}; err={e}"))
                .with_retryable(true)),
        }
    }
}

fn remote_rejected(base_url: &str) -> AppError {
    AppError::input(
        "AI_REMOTE_NOT_ALLOWED",
        "Ollama base URL must be localhost (127.0.0.1)",
    )
    .with_details(format!("base_url={base_url}"))
}
