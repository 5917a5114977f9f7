use budget_buddy_core::domain::tip::{Tip, TipSet};
use budget_buddy_core::llm::ProviderKind;
use budget_buddy_core::storage::CacheEntry;
use std::fmt::Write;

pub fn provider(kind: ProviderKind, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::json!({ "provider": kind }).to_string());
    }
    Ok(kind.to_string())
}

pub fn tip_set(set: &TipSet, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(set)?);
    }
    let mut out = format!(
        "Financial tips ({:?} via {}, {})\n",
        set.source,
        set.provider,
        set.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    out.push_str(&tips(&set.tips));
    Ok(out)
}

pub fn cache_entry(entry: &CacheEntry, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(entry)?);
    }
    let when = entry
        .generated_at()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| entry.timestamp.to_string());
    Ok(format!("Cached financial tips ({when})\n{}", tips(&entry.tips)))
}

fn tips(tips: &[Tip]) -> String {
    let mut out = String::new();
    for (idx, tip) in tips.iter().enumerate() {
        let _ = writeln!(out, "{}. [{}] {}", idx + 1, tip.priority, tip.title);
        let _ = writeln!(out, "   {}", tip.description);
    }
    out
}
