use crate::config::{non_empty_var, Settings};
use crate::llm::http::{non_empty_completion, send_json};
use crate::llm::{LlmClient, ProviderKind};
use crate::tips::prompt::SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "llama3";

/// Local Ollama server, `/api/generate` with streaming turned off.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_ollama_url()?.to_string();
        let model = non_empty_var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            http: settings.http_client()?,
            base_url,
            model,
        })
    }

    fn request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            system: SYSTEM_PROMPT.to_string(),
            stream: false,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let req = self.http.post(url).json(&self.request(prompt));

        let res: GenerateResponse = send_json(self.provider(), req).await?;
        non_empty_completion(self.provider(), Some(res.response))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> OllamaClient {
        let settings = Settings {
            ollama_url: Some(url.to_string()),
            ..Default::default()
        };
        OllamaClient::from_settings(&settings).unwrap()
    }

    #[test]
    fn request_disables_streaming() {
        let body = serde_json::to_value(client("http://localhost:11434").request("p")).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["prompt"], "p");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        assert!(client("http://127.0.0.1:9").complete("p").await.is_err());
    }
}
