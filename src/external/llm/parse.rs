//! Pulls structured answers out of free-form completion text.

/// The first JSON blob in `text`: from the first `{` or `[` to the last
/// matching closer. Markdown code fences around it are tolerated.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = match text.as_bytes()[start] {
        b'{' => '}',
        _ => ']',
    };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// The first non-empty line that is not a code fence, without list
/// markers or surrounding quotes.
pub fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .map(clean_item)
        .find(|line| !line.is_empty())
}

/// A list of short items: a JSON array of strings (also accepted as the
/// first array field of a JSON object), or else one item per line or
/// comma.
pub fn parse_list(text: &str) -> Vec<String> {
    if let Some(items) = extract_json(text).and_then(json_strings) {
        return items;
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("```"))
        .flat_map(|line| line.split(','))
        .map(clean_item)
        .filter(|item| !item.is_empty())
        .collect()
}

fn json_strings(blob: &str) -> Option<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(blob).ok()?;
    let array = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => map.into_iter().find_map(|(_, v)| match v {
            serde_json::Value::Array(items) => Some(items),
            _ => None,
        })?,
        _ => return None,
    };

    let items: Vec<String> = array
        .into_iter()
        .filter_map(|v| v.as_str().map(clean_item))
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Strips bullets, numbering and quotes from one item.
fn clean_item(raw: &str) -> String {
    let mut item = raw.trim();

    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = item.strip_prefix(bullet) {
            item = rest.trim_start();
        }
    }

    let digits = item.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &item[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            item = rest.trim_start();
        }
    }

    item.trim_matches(|c| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim()
        .to_string()
}
