use anyhow::Context;
use budget_buddy_core::domain::snapshot::FinancialSnapshot;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Reads a FinancialSnapshot JSON document from a file, or stdin for `-`.
pub async fn load(path: &Path) -> anyhow::Result<FinancialSnapshot> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read snapshot from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read snapshot {}", path.display()))?
    };
    parse(&text)
}

pub fn parse(text: &str) -> anyhow::Result<FinancialSnapshot> {
    let snapshot: FinancialSnapshot =
        serde_json::from_str(text).context("snapshot is not a valid FinancialSnapshot JSON")?;
    anyhow::ensure!(
        snapshot.monthly_income.is_finite() && snapshot.monthly_expenses.is_finite(),
        "monthlyIncome and monthlyExpenses must be finite numbers"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_snapshot() {
        let snapshot = parse(r#"{"monthlyIncome": 5000, "monthlyExpenses": 3500}"#).unwrap();
        assert_eq!(snapshot.monthly_income, 5000.0);
        assert!(snapshot.recent_transactions.is_empty());
    }

    #[test]
    fn rejects_bad_transaction_type() {
        let text = r#"{"recentTransactions": [{"category": "x", "amount": 1, "type": "transfer"}]}"#;
        assert!(parse(text).is_err());
    }
}
