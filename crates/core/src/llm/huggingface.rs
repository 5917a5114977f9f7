use crate::config::{non_empty_var, Settings};
use crate::llm::http::{non_empty_completion, send_json};
use crate::llm::{LlmClient, ProviderKind};
use crate::tips::prompt::SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
const MAX_NEW_TOKENS: u32 = 800;

/// Hugging Face hosted inference: one `inputs` prompt string per request.
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl HuggingFaceClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_huggingface_api_key()?.to_string();
        let base_url =
            non_empty_var("HUGGINGFACE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model =
            non_empty_var("HUGGINGFACE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            http: settings.http_client()?,
            api_key,
            base_url,
            model,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, prompt: &str) -> InferenceRequest {
        InferenceRequest {
            inputs: format!("{SYSTEM_PROMPT}\n\n{prompt}"),
            parameters: InferenceParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                return_full_text: false,
            },
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for HuggingFaceClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::HuggingFace
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let req = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt));

        let res: InferenceResponse = send_json(self.provider(), req).await?;
        non_empty_completion(self.provider(), res.into_text())
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

/// Text-generation models answer with a list; some deployments answer with a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    List(Vec<Generated>),
    Single(Generated),
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::List(items) => items.into_iter().next().map(|g| g.generated_text),
            InferenceResponse::Single(g) => Some(g.generated_text),
        }
    }
}
