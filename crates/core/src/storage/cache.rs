use crate::domain::snapshot::FinancialSnapshot;
use crate::domain::tip::Tip;
use crate::storage::KvStore;
use anyhow::Context;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const CACHE_KEY: &str = "budget_buddy.ai_tips";
pub const CACHE_VERSION: u32 = 1;

pub fn cache_ttl() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub tips: Vec<Tip>,
    /// Epoch millis of the generation.
    pub timestamp: i64,
    pub source_snapshot: FinancialSnapshot,
}

impl CacheEntry {
    pub fn new(tips: Vec<Tip>, source_snapshot: FinancialSnapshot, generated_at: DateTime<Utc>) -> Self {
        Self {
            tips,
            timestamp: generated_at.timestamp_millis(),
            source_snapshot,
        }
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// Fresh while strictly younger than the TTL. Entries stamped in the future count as fresh;
    /// an age that does not fit in i64 counts as stale.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match now.timestamp_millis().checked_sub(self.timestamp) {
            Some(age) => age < cache_ttl().num_milliseconds(),
            None => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    version: u32,
    entry: CacheEntry,
}

/// Just the version, read before committing to the entry layout.
#[derive(Debug, Deserialize)]
struct VersionHeader {
    version: Option<u32>,
}

#[derive(Debug)]
pub enum CacheError {
    Decode(serde_json::Error),
    VersionMismatch { found: Option<u32>, expected: u32 },
    InvalidTimestamp(i64),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Decode(err) => write!(f, "cached tips are not decodable: {err}"),
            CacheError::VersionMismatch { found: Some(found), expected } => write!(
                f,
                "cached tips have format version {found}, expected {expected}"
            ),
            CacheError::VersionMismatch { found: None, expected } => write!(
                f,
                "cached tips carry no format version, expected {expected}"
            ),
            CacheError::InvalidTimestamp(ts) => {
                write!(f, "cached tips have an out-of-range timestamp: {ts}")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Decode(err) => Some(err),
            CacheError::VersionMismatch { .. } | CacheError::InvalidTimestamp(_) => None,
        }
    }
}

/// Typed access to the single cached tip set, wrapped in a versioned envelope.
#[derive(Clone)]
pub struct TipCache {
    store: Arc<dyn KvStore>,
}

impl TipCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Reads the stored entry regardless of age.
    pub async fn read(&self) -> anyhow::Result<Option<CacheEntry>> {
        let Some(raw) = self.store.get(CACHE_KEY).await? else {
            return Ok(None);
        };
        Ok(Some(decode(&raw)?))
    }

    /// The stored entry if it is younger than 24h at `now`.
    pub async fn load(&self, now: DateTime<Utc>) -> anyhow::Result<Option<CacheEntry>> {
        let Some(entry) = self.read().await? else {
            return Ok(None);
        };
        if entry.is_fresh(now) {
            Ok(Some(entry))
        } else {
            tracing::debug!(timestamp = entry.timestamp, "cached tips are stale");
            Ok(None)
        }
    }

    /// Overwrites whatever is stored.
    pub async fn store(&self, entry: &CacheEntry) -> anyhow::Result<()> {
        let body = serde_json::to_string(&EnvelopeRef {
            version: CACHE_VERSION,
            entry,
        })
        .context("failed to encode cached tips")?;
        self.store.set(CACHE_KEY, &body).await
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.store.remove(CACHE_KEY).await
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    entry: &'a CacheEntry,
}

fn decode(raw: &str) -> Result<CacheEntry, CacheError> {
    let header: VersionHeader = serde_json::from_str(raw).map_err(CacheError::Decode)?;
    if header.version != Some(CACHE_VERSION) {
        return Err(CacheError::VersionMismatch {
            found: header.version,
            expected: CACHE_VERSION,
        });
    }
    let envelope: CacheEnvelope = serde_json::from_str(raw).map_err(CacheError::Decode)?;
    if envelope.entry.generated_at().is_none() {
        return Err(CacheError::InvalidTimestamp(envelope.entry.timestamp));
    }
    Ok(envelope.entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tip::Priority;
    use crate::storage::MemoryKvStore;
    use serde_json::json;

    fn cache() -> (TipCache, Arc<MemoryKvStore>) {
        let store = Arc::new(MemoryKvStore::new());
        (TipCache::new(store.clone()), store)
    }

    fn entry(at: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(
            vec![
                Tip::new("Save", "Save 10% of income.", Priority::High),
                Tip::new("Budget", "Set a grocery budget.", Priority::Low),
            ],
            FinancialSnapshot {
                monthly_income: 5000.0,
                monthly_expenses: 3500.0,
                ..Default::default()
            },
            at,
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn round_trip_within_ttl() {
        let (cache, _) = cache();
        let written = entry(t0());
        cache.store(&written).await.unwrap();

        let read = cache.load(t0() + Duration::hours(23)).await.unwrap().unwrap();
        assert_eq!(read.tips, written.tips);
        assert_eq!(read.source_snapshot, written.source_snapshot);
        assert_eq!(read.generated_at(), Some(t0()));
    }

    #[tokio::test]
    async fn ignored_after_ttl() {
        let (cache, _) = cache();
        cache.store(&entry(t0())).await.unwrap();
        assert!(cache.load(t0() + Duration::hours(24)).await.unwrap().is_none());
        assert!(cache.read().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let (cache, _) = cache();
        cache.store(&entry(t0())).await.unwrap();
        let newer = CacheEntry::new(
            vec![Tip::new("Only", "One tip.", Priority::Medium)],
            FinancialSnapshot::default(),
            t0() + Duration::minutes(5),
        );
        cache.store(&newer).await.unwrap();
        assert_eq!(cache.read().await.unwrap(), Some(newer));
    }

    #[tokio::test]
    async fn envelope_is_versioned_camel_case() {
        let (cache, store) = cache();
        cache.store(&entry(t0())).await.unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&store.get(CACHE_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(raw["version"], CACHE_VERSION);
        assert_eq!(raw["entry"]["timestamp"], t0().timestamp_millis());
        assert_eq!(raw["entry"]["sourceSnapshot"]["monthlyIncome"], 5000.0);
    }

    #[tokio::test]
    async fn unversioned_legacy_blob_fails_loudly() {
        let (cache, store) = cache();
        let legacy = json!({"tips": [], "timestamp": t0().timestamp_millis(), "userData": {}});
        store.set(CACHE_KEY, &legacy.to_string()).await.unwrap();

        let err = cache.load(t0()).await.unwrap_err();
        let cache_err = err.downcast_ref::<CacheError>().unwrap();
        assert!(matches!(
            cache_err,
            CacheError::VersionMismatch { found: None, expected: CACHE_VERSION }
        ));
    }

    #[tokio::test]
    async fn future_version_and_garbage_fail_loudly() {
        let (cache, store) = cache();
        store
            .set(CACHE_KEY, &json!({"version": 2, "entry": {}}).to_string())
            .await
            .unwrap();
        let err = cache.load(t0()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CacheError>(),
            Some(CacheError::VersionMismatch { found: Some(2), .. })
        ));

        store.set(CACHE_KEY, "{not json").await.unwrap();
        let err = cache.load(t0()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<CacheError>(), Some(CacheError::Decode(_))));
    }

    #[tokio::test]
    async fn extreme_timestamps_are_rejected_not_served() {
        for ts in [i64::MIN, i64::MAX] {
            let (cache, store) = cache();
            let blob = json!({
                "version": CACHE_VERSION,
                "entry": {"tips": [], "timestamp": ts, "sourceSnapshot": {}}
            });
            store.set(CACHE_KEY, &blob.to_string()).await.unwrap();

            let err = cache.load(t0()).await.unwrap_err();
            assert!(
                matches!(err.downcast_ref::<CacheError>(), Some(CacheError::InvalidTimestamp(t)) if *t == ts),
                "{err:#}"
            );
        }
    }

    #[test]
    fn freshness_never_overflows() {
        let mut e = entry(t0());
        e.timestamp = i64::MIN;
        assert!(!e.is_fresh(t0()));
        e.timestamp = i64::MAX;
        assert!(e.is_fresh(t0()));
    }

    #[tokio::test]
    async fn clear_removes_entry() {
        let (cache, _) = cache();
        cache.store(&entry(t0())).await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.read().await.unwrap().is_none());
    }
}
