pub mod domain;
pub mod events;
pub mod llm;
pub mod storage;
pub mod tips;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub openai_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub huggingface_api_key: Option<String>,
        pub ollama_url: Option<String>,
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub llm_timeout_secs: Option<u64>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let llm_timeout_secs = parse_var::<u64>("LLM_TIMEOUT_SECS")?;

            Ok(Self {
                openai_api_key: non_empty_var("OPENAI_API_KEY"),
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                huggingface_api_key: non_empty_var("HUGGINGFACE_API_KEY"),
                ollama_url: non_empty_var("OLLAMA_URL"),
                database_url: non_empty_var("DATABASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                llm_timeout_secs,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_huggingface_api_key(&self) -> anyhow::Result<&str> {
            self.huggingface_api_key
                .as_deref()
                .context("HUGGINGFACE_API_KEY is required")
        }

        pub fn require_ollama_url(&self) -> anyhow::Result<&str> {
            self.ollama_url.as_deref().context("OLLAMA_URL is required")
        }

        /// Shared HTTP client for every completion provider. No timeout unless configured.
        pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
            let mut builder = reqwest::Client::builder();
            if let Some(secs) = self.llm_timeout_secs {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            builder.build().context("failed to build reqwest client")
        }
    }

    /// Reads an env var, treating blank values as unset.
    pub fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Reads and parses an optional numeric env var. Unset or blank is `None`; a value that
    /// does not parse is an error rather than a silent default.
    pub fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        non_empty_var(key)
            .map(|raw| parse_value(key, &raw))
            .transpose()
    }

    fn parse_value<T>(key: &str, raw: &str) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        raw.parse::<T>()
            .with_context(|| format!("{key} must be a non-negative integer (got {raw})"))
    }

}
