use crate::llm::error::LlmDiagnosticsError;
use crate::llm::ProviderKind;
use anyhow::Context;
use serde::de::DeserializeOwned;

/// Sends a prepared request once and decodes the JSON body. Non-2xx responses become
/// [`LlmDiagnosticsError`] carrying the raw body.
pub async fn send_json<T: DeserializeOwned>(
    provider: ProviderKind,
    req: reqwest::RequestBuilder,
) -> anyhow::Result<T> {
    let res = req
        .send()
        .await
        .with_context(|| format!("{provider} request failed"))?;

    let status = res.status();
    let text = res
        .text()
        .await
        .with_context(|| format!("failed to read {provider} response body"))?;

    if !status.is_success() {
        return Err(LlmDiagnosticsError {
            provider,
            stage: "http",
            detail: format!("status={status}"),
            raw_output: Some(text),
        }
        .into());
    }

    serde_json::from_str::<T>(&text).map_err(|e| {
        anyhow::Error::from(LlmDiagnosticsError {
            provider,
            stage: "decode",
            detail: e.to_string(),
            raw_output: Some(text.clone()),
        })
    })
}

/// Rejects blank completions so the caller falls back instead of parsing nothing.
pub fn non_empty_completion(provider: ProviderKind, text: Option<String>) -> anyhow::Result<String> {
    match text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        Some(t) => Ok(t),
        None => Err(LlmDiagnosticsError {
            provider,
            stage: "completion",
            detail: "provider returned no completion text".to_string(),
            raw_output: None,
        }
        .into()),
    }
}
