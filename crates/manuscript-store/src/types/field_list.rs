//! Loosely-shaped list fields (authors, keywords)
//!
//! Clients send lists as repeated form fields, a comma-separated string, or a
//! JSON-encoded array. All three resolve to one canonical `Vec<String>`.

use serde_json::Value;

/// A list field as it arrived on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldList {
    /// Repeated form values (`authors[]=a&authors[]=b`)
    StringList(Vec<String>),
    /// A single comma-separated string (`"a, b"`)
    CommaString(String),
    /// A single JSON array string (`"[\"a\",\"b\"]"`)
    JsonString(String),
}

impl FieldList {
    /// Classify the raw values collected for one form field
    pub fn from_form_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            let value = values.remove(0);
            if value.trim_start().starts_with('[') {
                Self::JsonString(value)
            } else {
                Self::CommaString(value)
            }
        } else {
            Self::StringList(values)
        }
    }

    /// Normalize to trimmed, non-empty strings in input order
    pub fn normalize(&self) -> Vec<String> {
        match self {
            Self::StringList(items) => clean(items.iter().map(String::as_str)),
            Self::CommaString(s) => clean(s.split(',')),
            Self::JsonString(s) => match serde_json::from_str::<Vec<Value>>(s) {
                Ok(items) => {
                    let strings: Vec<String> = items.iter().filter_map(json_scalar).collect();
                    clean(strings.iter().map(String::as_str))
                }
                // Not valid JSON after all; treat as a comma list without the brackets
                Err(_) => clean(
                    s.trim()
                        .trim_start_matches('[')
                        .trim_end_matches(']')
                        .split(',')
                        .map(|p| p.trim().trim_matches('"')),
                ),
            },
        }
    }
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn clean<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_shapes_agree() {
        let expected = strings(&["Ada Lovelace", "Alan Turing"]);

        let list = FieldList::from_form_values(strings(&["  Ada Lovelace ", "Alan Turing", "  "]));
        assert!(matches!(list, FieldList::StringList(_)));
        assert_eq!(list.normalize(), expected);

        let comma = FieldList::from_form_values(strings(&["Ada Lovelace ,Alan Turing,, "]));
        assert!(matches!(comma, FieldList::CommaString(_)));
        assert_eq!(comma.normalize(), expected);

        let json = FieldList::from_form_values(strings(&[r#"[" Ada Lovelace", "Alan Turing", ""]"#]));
        assert!(matches!(json, FieldList::JsonString(_)));
        assert_eq!(json.normalize(), expected);
    }

    #[test]
    fn test_json_scalars_and_nulls() {
        let list = FieldList::JsonString(r#"["rust", 42, null, true]"#.to_string());
        assert_eq!(list.normalize(), strings(&["rust", "42", "true"]));
    }

    #[test]
    fn test_malformed_json_falls_back_to_commas() {
        let list = FieldList::JsonString(r#"["a", "b""#.to_string());
        assert_eq!(list.normalize(), strings(&["a", "b"]));
    }

    #[test]
    fn test_empty_inputs_normalize_to_nothing() {
        assert!(FieldList::CommaString(" , ,".into()).normalize().is_empty());
        assert!(FieldList::JsonString("[]".into()).normalize().is_empty());
        assert!(FieldList::StringList(vec![]).normalize().is_empty());
    }
}
