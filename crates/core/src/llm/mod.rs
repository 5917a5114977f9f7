use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod anthropic;
pub mod error;
pub mod http;
pub mod huggingface;
pub mod json;
pub mod ollama;
pub mod openai;

use anthropic::AnthropicClient;
use huggingface::HuggingFaceClient;
use ollama::OllamaClient;
use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    HuggingFace,
    Ollama,
    Fallback,
}

impl ProviderKind {
    /// Picks the first configured provider in precedence order:
    /// OpenAI, Anthropic, Hugging Face, local Ollama. Nothing configured selects the fallback.
    pub fn select(settings: &Settings) -> Self {
        if settings.openai_api_key.is_some() {
            ProviderKind::OpenAi
        } else if settings.anthropic_api_key.is_some() {
            ProviderKind::Anthropic
        } else if settings.huggingface_api_key.is_some() {
            ProviderKind::HuggingFace
        } else if settings.ollama_url.is_some() {
            ProviderKind::Ollama
        } else {
            ProviderKind::Fallback
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Sends one completion request and returns the text of the first completion.
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// The provider chosen for a process, fixed at construction.
#[derive(Debug, Clone)]
pub enum TipProvider {
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
    HuggingFace(HuggingFaceClient),
    Ollama(OllamaClient),
    Fallback,
}

impl TipProvider {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let provider = match ProviderKind::select(settings) {
            ProviderKind::OpenAi => TipProvider::OpenAi(OpenAiClient::from_settings(settings)?),
            ProviderKind::Anthropic => {
                TipProvider::Anthropic(AnthropicClient::from_settings(settings)?)
            }
            ProviderKind::HuggingFace => {
                TipProvider::HuggingFace(HuggingFaceClient::from_settings(settings)?)
            }
            ProviderKind::Ollama => TipProvider::Ollama(OllamaClient::from_settings(settings)?),
            ProviderKind::Fallback => TipProvider::Fallback,
        };
        tracing::info!(provider = %provider.kind(), "selected tip provider");
        Ok(provider)
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            TipProvider::OpenAi(c) => c.provider(),
            TipProvider::Anthropic(c) => c.provider(),
            TipProvider::HuggingFace(c) => c.provider(),
            TipProvider::Ollama(c) => c.provider(),
            TipProvider::Fallback => ProviderKind::Fallback,
        }
    }

    pub async fn send(&self, prompt: &str) -> anyhow::Result<String> {
        match self {
            TipProvider::OpenAi(c) => c.complete(prompt).await,
            TipProvider::Anthropic(c) => c.complete(prompt).await,
            TipProvider::HuggingFace(c) => c.complete(prompt).await,
            TipProvider::Ollama(c) => c.complete(prompt).await,
            TipProvider::Fallback => Err(LlmDiagnosticsError {
                provider: ProviderKind::Fallback,
                stage: "config",
                detail: "no provider credential configured".to_string(),
                raw_output: None,
            }
            .into()),
        }
    }
}
