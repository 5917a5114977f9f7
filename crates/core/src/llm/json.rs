/// Strips a surrounding Markdown fence (```json ... ``` or ``` ... ```), if any.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let mut inner = trimmed;
    if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
        inner = after_first;
    }
    if let Some(end) = inner.rfind("```") {
        inner = &inner[..end];
    }
    inner.trim()
}

/// Best-effort extraction of an embedded JSON array: first '[' to the last ']' after it.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let body = strip_fences(text);
    let start = body.find('[')?;
    let end = body.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(body[start..=end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_handles_fenced_blocks() {
        let body = r#"[{"title":"a"}]"#;
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json_array(&fenced), Some(body));
    }

    #[test]
    fn extract_spans_first_to_last_bracket() {
        let s = r#"Here you go: [{"title":"a","tags":["x"]}] Enjoy!"#;
        assert_eq!(
            extract_json_array(s),
            Some(r#"[{"title":"a","tags":["x"]}]"#)
        );
    }

    #[test]
    fn extract_requires_ordered_brackets() {
        assert_eq!(extract_json_array("no list here"), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[test]
    fn strip_fences_leaves_plain_text() {
        assert_eq!(strip_fences("  plain  "), "plain");
    }
}
