use crate::domain::snapshot::FinancialSnapshot;
use crate::domain::tip::{TipSet, TipSource};
use crate::llm::{ProviderKind, TipProvider};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod fallback;
pub mod parser;
pub mod prompt;
pub mod session;

use fallback::FallbackTips;
use parser::parse_tips;
use prompt::build_prompt;

/// One provider call per generation; any provider or parse failure degrades to the static tips.
#[derive(Debug)]
pub struct TipGenerator {
    provider: TipProvider,
    fallback: FallbackTips,
}

impl TipGenerator {
    pub fn new(provider: TipProvider, fallback: FallbackTips) -> Self {
        Self { provider, fallback }
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub async fn generate(&self, snapshot: &FinancialSnapshot, now: DateTime<Utc>) -> TipSet {
        let generation_id = Uuid::new_v4();
        let provider = self.provider.kind();

        let (source, tips) = match &self.provider {
            TipProvider::Fallback => {
                tracing::debug!(%generation_id, "no provider configured; serving static tips");
                (TipSource::Fallback, self.fallback.pick())
            }
            configured => {
                let prompt = build_prompt(snapshot);
                match configured.send(&prompt).await {
                    Ok(text) => match parse_tips(&text).into_tips() {
                        Some(tips) => (TipSource::Provider, tips),
                        None => {
                            tracing::warn!(%generation_id, %provider, "provider answer had no usable tips; serving static tips");
                            (TipSource::Fallback, self.fallback.pick())
                        }
                    },
                    Err(err) => {
                        tracing::warn!(%generation_id, %provider, error = %format!("{err:#}"), "provider call failed; serving static tips");
                        (TipSource::Fallback, self.fallback.pick())
                    }
                }
            }
        };

        tracing::info!(%generation_id, %provider, ?source, tips = tips.len(), "generated financial tips");

        TipSet {
            generation_id,
            provider,
            source,
            generated_at: now,
            tips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::llm::http::test_server::serve_once;
    use crate::llm::openai::OpenAiClient;
    use serde_json::json;

    fn snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            monthly_income: 5000.0,
            monthly_expenses: 3500.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn unconfigured_generator_serves_fallback() {
        let generator = TipGenerator::new(TipProvider::Fallback, FallbackTips::seeded(3));
        let set = generator.generate(&snapshot(), Utc::now()).await;
        assert_eq!(set.provider, ProviderKind::Fallback);
        assert_eq!(set.source, TipSource::Fallback);
        assert!((3..=5).contains(&set.tips.len()));
        let all = FallbackTips::all();
        assert!(set.tips.iter().all(|t| all.contains(t)));
    }

    #[tokio::test]
    async fn network_error_resolves_to_fallback() {
        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let client = OpenAiClient::from_settings(&settings)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let generator = TipGenerator::new(TipProvider::OpenAi(client), FallbackTips::seeded(3));

        let set = generator.generate(&snapshot(), Utc::now()).await;
        assert_eq!(set.provider, ProviderKind::OpenAi);
        assert_eq!(set.source, TipSource::Fallback);
        assert!((3..=5).contains(&set.tips.len()));
    }

    fn openai_at(base_url: String) -> TipGenerator {
        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let client = OpenAiClient::from_settings(&settings)
            .unwrap()
            .with_base_url(base_url);
        TipGenerator::new(TipProvider::OpenAi(client), FallbackTips::seeded(3))
    }

    fn chat_body(content: &str) -> String {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
    }

    #[tokio::test]
    async fn provider_answer_becomes_provider_tips() {
        let content = r#"Here you go:
```json
[
  {"title": "Automate savings", "description": "Move 10% of each paycheck into savings on payday.", "priority": "high"},
  {"title": "Review subscriptions", "description": "Cancel services you have not used this month.", "priority": "medium"}
]
```"#;
        let generator = openai_at(serve_once(200, chat_body(content)).await);

        let set = generator.generate(&snapshot(), Utc::now()).await;
        assert_eq!(set.provider, ProviderKind::OpenAi);
        assert_eq!(set.source, TipSource::Provider);
        assert_eq!(set.tips.len(), 2);
        assert_eq!(set.tips[0].title, "Automate savings");
        assert!(set.tips.iter().all(|t| !FallbackTips::all().contains(t)));
    }

    #[tokio::test]
    async fn provider_error_status_resolves_to_fallback() {
        let body = json!({"error": {"message": "rate limited"}}).to_string();
        let generator = openai_at(serve_once(429, body).await);

        let set = generator.generate(&snapshot(), Utc::now()).await;
        assert_eq!(set.provider, ProviderKind::OpenAi);
        assert_eq!(set.source, TipSource::Fallback);
        let all = FallbackTips::all();
        assert!(set.tips.iter().all(|t| all.contains(t)));
    }

    #[tokio::test]
    async fn unusable_provider_text_resolves_to_fallback() {
        let generator = openai_at(serve_once(200, chat_body("ok\nsure\n1.")).await);

        let set = generator.generate(&snapshot(), Utc::now()).await;
        assert_eq!(set.source, TipSource::Fallback);
        assert!((3..=5).contains(&set.tips.len()));
    }
}
