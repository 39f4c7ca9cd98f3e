//! Generated output parsing
//!
//! Model replies are not guaranteed to be clean JSON. Parsing degrades to
//! per-object extraction and finally to an empty result, never an error.

use serde::{Deserialize, Deserializer, Serialize};

/// A flag as reported by the text generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFlag {
    #[serde(alias = "id", deserialize_with = "id_text")]
    pub subscription_id: String,
    #[serde(default)]
    pub reason: String,
}

/// Parse a reply into flags
pub fn parse_generated_flags(raw: &str) -> Vec<GeneratedFlag> {
    let Some(json_str) = extract_json_array(raw) else {
        return vec![];
    };

    match serde_json::from_str::<Vec<GeneratedFlag>>(json_str) {
        Ok(flags) => flags,
        Err(e) => {
            log::debug!("Generated array did not parse ({}), extracting objects", e);
            parse_objects(json_str)
        }
    }
}

/// Outermost `[...]` slice of the reply
fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Pull individual top-level objects out of a malformed array
fn parse_objects(json_str: &str) -> Vec<GeneratedFlag> {
    let mut flags = Vec::new();
    let mut depth = 0usize;
    let mut start = None;

    for (i, ch) in json_str.char_indices() {
        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        if let Ok(flag) = serde_json::from_str::<GeneratedFlag>(&json_str[s..=i]) {
                            flags.push(flag);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    flags
}

fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected id: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_array() {
        let flags = parse_generated_flags(r#"[{"subscriptionId":"s1","reason":"expires soon"}]"#);
        assert_eq!(flags, vec![GeneratedFlag {
            subscription_id: "s1".to_string(),
            reason: "expires soon".to_string(),
        }]);
    }

    #[test]
    fn test_parse_array_wrapped_in_prose_and_fences() {
        let raw = "Here you go:\n```json\n[{\"subscriptionId\": 12, \"reason\": \"cancelled but renewing\"}]\n```";
        let flags = parse_generated_flags(raw);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].subscription_id, "12");
    }

    #[test]
    fn test_parse_falls_back_to_objects() {
        let raw = r#"[{"subscriptionId":"s1","reason":"a"}, {"subscriptionId":"s2","reason":"b",}, {"id":"s3"}]"#;
        let flags = parse_generated_flags(raw);
        let ids: Vec<&str> = flags.iter().map(|f| f.subscription_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s3"]);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_generated_flags("no anomalies found").is_empty());
        assert!(parse_generated_flags("] backwards [").is_empty());
        assert!(parse_generated_flags("[]").is_empty());
    }
}
