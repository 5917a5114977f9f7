use crate::domain::snapshot::FinancialSnapshot;
use crate::domain::tip::{TipSet, TipSource};
use crate::events::{EventBus, Notification};
use crate::storage::{CacheEntry, TipCache};
use crate::tips::TipGenerator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const GENERATION_FAILED: &str = "Failed to generate financial tips";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready(TipSet),
    Errored { error: String },
}

impl SessionState {
    pub fn tips(&self) -> Option<&TipSet> {
        match self {
            SessionState::Ready(set) => Some(set),
            _ => None,
        }
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, SessionState::Errored { .. })
    }
}

/// Tip lifecycle for one consumer: `Uninitialized -> Loading -> Ready | Errored`.
///
/// Refreshes are not de-duplicated. Each one writes its result when it resolves, so the last
/// to finish wins, in the session state and in the cache alike.
pub struct TipSession {
    generator: Arc<TipGenerator>,
    cache: TipCache,
    events: Arc<EventBus>,
    state: RwLock<SessionState>,
}

impl TipSession {
    pub fn new(generator: Arc<TipGenerator>, cache: TipCache, events: Arc<EventBus>) -> Self {
        Self {
            generator,
            cache,
            events,
            state: RwLock::new(SessionState::Uninitialized),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub fn generator(&self) -> &TipGenerator {
        &self.generator
    }

    /// Reuses fresh cached tips, otherwise generates when the snapshot has any activity.
    pub async fn start(&self, snapshot: &FinancialSnapshot, now: DateTime<Utc>) -> SessionState {
        match self.cache.load(now).await {
            Ok(Some(entry)) => {
                let set = TipSet {
                    generation_id: uuid::Uuid::new_v4(),
                    provider: self.generator.provider_kind(),
                    source: TipSource::Cache,
                    generated_at: entry.generated_at().unwrap_or(now),
                    tips: entry.tips,
                };
                tracing::info!(tips = set.tips.len(), "serving cached financial tips");
                return self.set_state(SessionState::Ready(set)).await;
            }
            Ok(None) => {}
            Err(err) => return self.fail(err).await,
        }

        if snapshot.has_activity() {
            self.refresh(snapshot, now).await
        } else {
            self.state().await
        }
    }

    pub async fn refresh(&self, snapshot: &FinancialSnapshot, now: DateTime<Utc>) -> SessionState {
        self.set_state(SessionState::Loading).await;

        match self.generate_and_store(snapshot, now).await {
            Ok(set) => {
                let message = match set.source {
                    TipSource::Fallback => "Showing general financial tips",
                    _ => "Financial tips updated",
                };
                self.events.publish(Notification::success(message));
                self.set_state(SessionState::Ready(set)).await
            }
            Err(err) => self.fail(err).await,
        }
    }

    /// Manual retry, only offered from `Errored`. Returns `None` in any other state.
    pub async fn retry(
        &self,
        snapshot: &FinancialSnapshot,
        now: DateTime<Utc>,
    ) -> Option<SessionState> {
        if !self.state.read().await.is_errored() {
            return None;
        }
        Some(self.refresh(snapshot, now).await)
    }

    async fn generate_and_store(
        &self,
        snapshot: &FinancialSnapshot,
        now: DateTime<Utc>,
    ) -> anyhow::Result<TipSet> {
        let set = self.generator.generate(snapshot, now).await;
        let entry = CacheEntry::new(set.tips.clone(), snapshot.clone(), set.generated_at);
        self.cache.store(&entry).await?;
        Ok(set)
    }

    async fn fail(&self, err: anyhow::Error) -> SessionState {
        tracing::error!(error = %format!("{err:#}"), "tip generation failed");
        self.events.publish(Notification::error(GENERATION_FAILED));
        self.set_state(SessionState::Errored {
            error: GENERATION_FAILED.to_string(),
        })
        .await
    }

    async fn set_state(&self, next: SessionState) -> SessionState {
        let mut state = self.state.write().await;
        *state = next.clone();
        next
    }
}
