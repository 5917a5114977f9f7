use crate::domain::tip::{Priority, Tip};
use crate::llm::json::{extract_json_array, strip_fences};
use serde_json::Value;

pub const MAX_TIPS: usize = 5;
const MIN_LINE_CHARS: usize = 11;
const MAX_TITLE_CHARS: usize = 60;

/// How a provider answer was turned into tips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Decoded from an embedded JSON array.
    Structured(Vec<Tip>),
    /// Recovered line by line with positional priorities.
    Lines(Vec<Tip>),
    /// Nothing usable; the caller substitutes the static fallback.
    Unusable,
}

impl ParseOutcome {
    pub fn into_tips(self) -> Option<Vec<Tip>> {
        match self {
            ParseOutcome::Structured(tips) | ParseOutcome::Lines(tips) => Some(tips),
            ParseOutcome::Unusable => None,
        }
    }
}

pub fn parse_tips(text: &str) -> ParseOutcome {
    if let Some(raw) = extract_json_array(text) {
        match serde_json::from_str::<Vec<Value>>(raw) {
            Ok(entries) => {
                let tips: Vec<Tip> = entries
                    .iter()
                    .filter_map(tip_from_value)
                    .take(MAX_TIPS)
                    .collect();
                if tips.is_empty() {
                    tracing::debug!(entries = entries.len(), "JSON tip list had no valid entries");
                    return ParseOutcome::Unusable;
                }
                return ParseOutcome::Structured(tips);
            }
            Err(err) => {
                tracing::debug!(error = %err, "embedded tip list is not valid JSON; splitting lines");
            }
        }
    }

    let tips = tips_from_lines(text);
    if tips.is_empty() {
        ParseOutcome::Unusable
    } else {
        ParseOutcome::Lines(tips)
    }
}

fn tip_from_value(value: &Value) -> Option<Tip> {
    let obj = value.as_object()?;
    let title = obj.get("title")?.as_str()?.trim();
    let description = obj.get("description")?.as_str()?.trim();
    let priority = obj.get("priority")?.as_str()?.parse::<Priority>().ok()?;
    if title.is_empty() || description.is_empty() {
        return None;
    }
    Some(Tip::new(title, description, priority))
}

fn tips_from_lines(text: &str) -> Vec<Tip> {
    strip_fences(text)
        .lines()
        .map(clean_line)
        .filter(|line| line.chars().count() >= MIN_LINE_CHARS)
        .take(MAX_TIPS)
        .enumerate()
        .map(|(idx, line)| {
            let priority = Priority::for_position(idx);
            match split_title(line) {
                Some((title, description)) => Tip::new(title, description, priority),
                None => Tip::new(format!("Tip {}", idx + 1), line, priority),
            }
        })
        .collect()
}

/// Drops list markers such as `1.`, `2)`, `-`, `*`, `•` and Markdown headings.
fn clean_line(line: &str) -> &str {
    let mut s = line.trim();
    loop {
        let before = s.len();
        s = s.trim_start_matches(['#', '-', '*', '•']).trim_start();

        let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            let rest = &s[digits..];
            // A marker needs whitespace after it; "1.5%" is content, not a list number.
            if let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
                if after.is_empty() || after.starts_with(char::is_whitespace) {
                    s = after.trim_start();
                }
            }
        }

        if s.len() == before {
            return s.trim_end();
        }
    }
}

fn split_title(line: &str) -> Option<(&str, &str)> {
    let (head, tail) = line.split_once(':')?;
    let title = head.trim().trim_matches('*').trim();
    let description = tail.trim().trim_matches('*').trim();
    if title.is_empty() || description.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return None;
    }
    Some((title, description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tips(outcome: ParseOutcome) -> Vec<Tip> {
        outcome.into_tips().unwrap()
    }

    #[test]
    fn decodes_embedded_json_list() {
        let text = format!(
            "Sure! Here are your tips:\n{}\nGood luck.",
            json!([
                {"title": "Cut dining out", "description": "Cook at home twice more a week.", "priority": "high"},
                {"title": "Raise savings", "description": "Move 5% more to savings.", "priority": "Medium"},
                {"title": "Check fees", "description": "Look for bank fees.", "priority": "low"}
            ])
        );
        let outcome = parse_tips(&text);
        assert!(matches!(outcome, ParseOutcome::Structured(_)));
        let tips = tips(outcome);
        assert_eq!(tips.len(), 3);
        assert_eq!(tips[1].priority, Priority::Medium);
        assert_eq!(tips[0].title, "Cut dining out");
    }

    #[test]
    fn drops_invalid_entries_and_caps_at_five() {
        let mut entries = vec![
            json!({"title": "No description", "priority": "high"}),
            json!({"title": "Bad priority", "description": "x", "priority": "urgent"}),
            json!("just a string"),
        ];
        for i in 0..7 {
            entries.push(json!({"title": format!("T{i}"), "description": "d", "priority": "low"}));
        }
        let tips = tips(parse_tips(&Value::Array(entries).to_string()));
        assert_eq!(tips.len(), 5);
        assert_eq!(tips[0].title, "T0");
    }

    #[test]
    fn list_without_any_valid_tip_is_unusable() {
        assert_eq!(parse_tips("[1, 2, 3]"), ParseOutcome::Unusable);
        assert_eq!(parse_tips(r#"[{"foo": "bar"}]"#), ParseOutcome::Unusable);
        assert_eq!(parse_tips("[]"), ParseOutcome::Unusable);
    }

    #[test]
    fn malformed_json_falls_back_to_lines() {
        let text = "[\n1. Build an emergency fund of three months\n2) Pay off the credit card with the highest rate\n- Cancel unused streaming subscriptions\n* Automate a transfer to savings on payday\n• Compare insurance quotes once a year\n6. This sixth line should be dropped entirely\n";
        let outcome = parse_tips(text);
        assert!(matches!(outcome, ParseOutcome::Lines(_)));
        let tips = tips(outcome);
        assert_eq!(tips.len(), 5);
        assert_eq!(
            tips.iter().map(|t| t.priority).collect::<Vec<_>>(),
            vec![
                Priority::High,
                Priority::High,
                Priority::Medium,
                Priority::Medium,
                Priority::Low
            ]
        );
        assert_eq!(tips[0].title, "Tip 1");
        assert_eq!(tips[0].description, "Build an emergency fund of three months");
        assert_eq!(tips[2].description, "Cancel unused streaming subscriptions");
    }

    #[test]
    fn title_prefixed_lines_are_split() {
        let text = "1. **Emergency fund**: Keep three months of expenses aside.\nok\n";
        let tips = tips(parse_tips(text));
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].title, "Emergency fund");
        assert_eq!(tips[0].description, "Keep three months of expenses aside.");
        assert_eq!(tips[0].priority, Priority::High);
    }

    #[test]
    fn trivial_text_is_unusable() {
        assert_eq!(parse_tips(""), ParseOutcome::Unusable);
        assert_eq!(parse_tips("ok\n-\n1.\nshort"), ParseOutcome::Unusable);
    }

    #[test]
    fn clean_line_strips_markers() {
        assert_eq!(clean_line("  12. Save more  "), "Save more");
        assert_eq!(clean_line("## - 3) Nested"), "Nested");
        assert_eq!(clean_line("2024 budget review"), "2024 budget review");
        assert_eq!(clean_line("3)"), "");
    }

    #[test]
    fn leading_decimals_are_not_list_markers() {
        assert_eq!(
            clean_line("1.5% more savings each month"),
            "1.5% more savings each month"
        );
        assert_eq!(clean_line("2. 1.5% more savings"), "1.5% more savings");
        assert_eq!(clean_line("4)-percent rule"), "4)-percent rule");

        let tips = tips(parse_tips("1.5% more savings each month adds up"));
        assert_eq!(tips[0].description, "1.5% more savings each month adds up");
    }
}
