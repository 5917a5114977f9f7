use crate::domain::snapshot::{FinancialSnapshot, TransactionKind};
use std::fmt::Write;

pub const SYSTEM_PROMPT: &str = "You are a helpful financial advisor. \
Give practical, specific and encouraging personal finance advice. \
Answer only with the JSON array that is asked for.";

const MAX_TRANSACTIONS: usize = 10;

/// Builds the user prompt asking for 3-5 tips as a JSON array.
pub fn build_prompt(snapshot: &FinancialSnapshot) -> String {
    let mut out = String::new();

    out.push_str(
        "Based on the following financial information, provide 3-5 personalized financial tips.\n\n",
    );
    let _ = writeln!(out, "Monthly income: ${}", snapshot.monthly_income);
    let _ = writeln!(out, "Monthly expenses: ${}", snapshot.monthly_expenses);
    let _ = writeln!(out, "Savings rate: {:.1}%", snapshot.savings_rate());

    let goals: Vec<&str> = snapshot
        .savings_goals
        .iter()
        .map(|g| g.name.as_str())
        .collect();
    let _ = writeln!(out, "Savings goals: {}", join_or_none(&goals));

    let categories: Vec<&str> = snapshot.categories.iter().map(String::as_str).collect();
    let _ = writeln!(out, "Spending categories: {}", join_or_none(&categories));

    if snapshot.recent_transactions.is_empty() {
        out.push_str("Recent transactions: none\n");
    } else {
        out.push_str("Recent transactions:\n");
        for tx in snapshot.recent_transactions.iter().take(MAX_TRANSACTIONS) {
            let kind = match tx.kind {
                TransactionKind::Income => "income",
                TransactionKind::Expense => "expense",
            };
            let _ = writeln!(out, "- {kind}: {} ${}", tx.category, tx.amount);
        }
    }

    out.push_str(
        "\nRespond with a JSON array of 3-5 objects. Each object must have the keys \
\"title\" (short headline), \"description\" (one or two actionable sentences) and \
\"priority\" (one of \"high\", \"medium\", \"low\"). Example:\n\
[{\"title\": \"Build an emergency fund\", \"description\": \"Set aside three months of expenses.\", \"priority\": \"high\"}]\n",
    );

    out
}

fn join_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
