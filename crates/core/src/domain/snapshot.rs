use serde::{Deserialize, Serialize};

/// The financial figures a single tip generation is based on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    #[serde(default)]
    pub monthly_income: f64,
    #[serde(default)]
    pub monthly_expenses: f64,
    #[serde(default)]
    pub savings_goals: Vec<SavingsGoal>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub recent_transactions: Vec<TransactionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub category: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl FinancialSnapshot {
    /// (income - expenses) / income * 100, or 0 when there is no positive income.
    pub fn savings_rate(&self) -> f64 {
        if self.monthly_income <= 0.0 {
            return 0.0;
        }
        (self.monthly_income - self.monthly_expenses) / self.monthly_income * 100.0
    }

    /// Whether there is enough data to be worth generating personalised tips on load.
    pub fn has_activity(&self) -> bool {
        self.monthly_income > 0.0 || !self.recent_transactions.is_empty()
    }
}
