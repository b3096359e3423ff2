//! YAML front-matter rendering and splitting.
//!
//! Rendering writes one `key: value` line per entry. Strings, numbers and
//! booleans are written bare; arrays and objects as JSON flow values, which
//! YAML reads back unchanged.

use serde_json::{Map, Value};

const DELIMITER: &str = "---";

/// Render a front-matter block, including both delimiters and a trailing blank line.
pub fn render(metadata: &Map<String, Value>) -> String {
    let mut out = String::from("---\n");
    for (key, value) in metadata {
        let rendered = match value {
            Value::String(s) if needs_quotes(s) => value.to_string(),
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        out.push_str(key);
        out.push(':');
        if !rendered.is_empty() {
            out.push(' ');
            out.push_str(&rendered);
        }
        out.push('\n');
    }
    out.push_str("---\n\n");
    out
}

/// Strings YAML would misread as another type, or fail to parse, get JSON quoting.
fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s != s.trim()
        || s.contains(": ")
        || s.contains(" #")
        || s.contains('\n')
        || s.starts_with(|c: char| "-?:,[]{}#&*!|>'\"%@`".contains(c))
        || matches!(
            s.to_ascii_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "null" | "~"
        )
        || s.parse::<f64>().is_ok()
}

/// Split content into its front-matter mapping and body.
///
/// Content without a leading `---` line, with an unclosed block, or whose
/// block is not a YAML mapping is returned whole as the body.
pub fn split(content: &str) -> (Option<Map<String, Value>>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = rest[offset + line.len()..].trim_start_matches(['\r', '\n']);
            if yaml.trim().is_empty() {
                return (Some(Map::new()), body);
            }
            return match serde_yaml::from_str::<Value>(yaml) {
                Ok(Value::Object(map)) => (Some(map), body),
                Ok(_) | Err(_) => {
                    tracing::debug!("front-matter is not a YAML mapping; treating as body");
                    (None, content)
                }
            };
        }
        offset += line.len();
    }

    (None, content)
}

/// The note body with any front-matter removed.
pub fn body(content: &str) -> &str {
    split(content).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn render_writes_scalars_bare_and_lists_as_flow() {
        let meta = map(json!({"type": "dashboard", "version": 2, "tags": ["a", "b"]}));
        let out = render(&meta);
        assert!(out.starts_with("---\n"));
        assert!(out.contains("type: dashboard\n"));
        assert!(out.contains("version: 2\n"));
        assert!(out.contains("tags: [\"a\",\"b\"]\n"));
        assert!(out.ends_with("---\n\n"));
    }

    #[test]
    fn split_reads_rendered_block_back() {
        let meta = map(json!({"type": "ai_context", "tags": ["x", "y"]}));
        let content = format!("{}# Title\nbody", render(&meta));
        let (parsed, body) = split(&content);
        let parsed = parsed.unwrap();
        assert_eq!(parsed["type"], json!("ai_context"));
        assert_eq!(parsed["tags"], json!(["x", "y"]));
        assert_eq!(body, "# Title\nbody");
    }

    #[test]
    fn ambiguous_strings_survive_round_trip() {
        let meta = map(json!({"version": "2.0", "flag": "yes", "note": "a: b"}));
        let content = render(&meta);
        let (parsed, _) = split(&content);
        let parsed = parsed.unwrap();
        assert_eq!(parsed["version"], json!("2.0"));
        assert_eq!(parsed["flag"], json!("yes"));
        assert_eq!(parsed["note"], json!("a: b"));
    }

    #[test]
    fn split_without_front_matter_returns_whole_content() {
        let (meta, body) = split("# Just a note\n");
        assert!(meta.is_none());
        assert_eq!(body, "# Just a note\n");
    }

    #[test]
    fn unclosed_block_is_body() {
        let content = "---\ntype: x\nno closing line\n";
        let (meta, body) = split(content);
        assert!(meta.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn non_mapping_block_is_body() {
        let content = "---\n- a\n- b\n---\ntext\n";
        let (meta, body) = split(content);
        assert!(meta.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn empty_block_is_empty_mapping() {
        let (meta, body) = split("---\n---\ntext");
        assert_eq!(meta, Some(Map::new()));
        assert_eq!(body, "text");
    }
}
