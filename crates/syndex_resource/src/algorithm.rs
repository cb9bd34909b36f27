//! Payload decoding and field extraction.

use crate::error::{ResourceError, ResourceResult};
use crate::field::FieldDefinition;
use crate::record::Record;
use serde_json::Value;

/// Decodes raw payloads into records and extracts field values from them.
///
/// Implementations must be restartable: `decode` holds no state between
/// calls, and the same payload always decodes to the same records.
///
/// # Error scoping
///
/// - A corrupt payload fails `decode` for that payload only
/// - A malformed extraction expression fails `extract` for that field only;
///   missing data is never an error and extracts zero values
pub trait Algorithm: Send + Sync {
    /// Decodes a raw payload into records.
    ///
    /// The root path selects either a single object (one record) or a
    /// collection (one record per element).
    fn decode(&self, payload: &str, root_path: &str) -> ResourceResult<Vec<Record>>;

    /// Extracts the ordered values of one field from a record.
    fn extract(&self, record: &Record, field: &FieldDefinition) -> ResourceResult<Vec<String>>;
}

/// The default [`Algorithm`] over JSON payloads.
///
/// Expressions are simple JSON paths: `$['uuid']`, `$.person.name`, or bare
/// dotted paths like `person.name`. A bracketed key is a single literal step
/// (it may contain dots); dot notation navigates nested objects. A step
/// applied to an array fans out over its elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAlgorithm;

impl JsonAlgorithm {
    /// Creates a new JSON algorithm.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Algorithm for JsonAlgorithm {
    fn decode(&self, payload: &str, root_path: &str) -> ResourceResult<Vec<Record>> {
        let body: Value =
            serde_json::from_str(payload).map_err(|e| ResourceError::decode(e.to_string()))?;
        let steps = parse_path(root_path).map_err(|message| {
            ResourceError::decode(format!("bad root path `{root_path}`: {message}"))
        })?;

        let selected = select(&body, &steps);
        if selected.is_empty() {
            return Err(ResourceError::decode(format!(
                "root path `{root_path}` matched nothing"
            )));
        }

        let mut records = Vec::new();
        for value in selected {
            match value {
                Value::Array(items) => {
                    records.extend(items.iter().cloned().map(Record::new));
                }
                other => records.push(Record::new(other.clone())),
            }
        }
        Ok(records)
    }

    fn extract(&self, record: &Record, field: &FieldDefinition) -> ResourceResult<Vec<String>> {
        let steps = parse_path(field.expression())
            .map_err(|message| ResourceError::extraction(field.name(), message))?;

        let mut values = Vec::new();
        for leaf in leaves(select(record.body(), &steps)) {
            if let Some(value) = stringify(leaf) {
                values.push(value);
            }
        }
        Ok(values)
    }
}

/// Parses a path expression into navigation steps.
fn parse_path(expression: &str) -> Result<Vec<String>, String> {
    let expression = expression.trim();
    let mut steps = Vec::new();
    let mut chars = expression.chars().peekable();

    if chars.peek() == Some(&'$') {
        chars.next();
    }

    loop {
        match chars.peek() {
            None => break,
            Some('.') => {
                chars.next();
                let name = take_bare(&mut chars);
                if name.is_empty() {
                    return Err("empty path step".into());
                }
                steps.push(name);
            }
            Some('[') => {
                chars.next();
                let quote = match chars.next() {
                    Some(q @ ('\'' | '"')) => q,
                    _ => return Err("expected quoted key after `[`".into()),
                };
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err("unterminated quoted key".into());
                }
                if chars.next() != Some(']') {
                    return Err("expected `]` after quoted key".into());
                }
                if name.is_empty() {
                    return Err("empty path step".into());
                }
                steps.push(name);
            }
            Some(_) => {
                if !steps.is_empty() {
                    return Err(format!("unexpected character in path `{expression}`"));
                }
                steps.push(take_bare(&mut chars));
            }
        }
    }

    Ok(steps)
}

fn take_bare(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' || c == '[' {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// Navigates the steps, fanning out over arrays at every level.
fn select<'a>(root: &'a Value, steps: &[String]) -> Vec<&'a Value> {
    let mut current = vec![root];
    for step in steps {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(child) = map.get(step) {
                        next.push(child);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(child) = item.get(step) {
                            next.push(child);
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    current
}

/// Expands array leaves one level so each element yields a value.
fn leaves(selected: Vec<&Value>) -> Vec<&Value> {
    let mut out = Vec::new();
    for value in selected {
        match value {
            Value::Array(items) => out.extend(items.iter()),
            other => out.push(other),
        }
    }
    out
}

/// Renders a scalar leaf as its display string. Null yields no value.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(expression: &str) -> FieldDefinition {
        FieldDefinition::new("test", expression, false)
    }

    #[test]
    fn decode_single_object() {
        let algorithm = JsonAlgorithm::new();
        let records = algorithm.decode(r#"{"uuid": "abc-1"}"#, "$").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body()["uuid"], "abc-1");
    }

    #[test]
    fn decode_collection_root() {
        let algorithm = JsonAlgorithm::new();
        let payload = r#"{"results": [{"uuid": "a"}, {"uuid": "b"}]}"#;
        let records = algorithm.decode(payload, "$['results']").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn decode_empty_collection_yields_no_records() {
        let algorithm = JsonAlgorithm::new();
        let records = algorithm.decode(r#"{"results": []}"#, "$['results']").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn decode_missing_root_fails() {
        let algorithm = JsonAlgorithm::new();
        let result = algorithm.decode(r#"{"other": 1}"#, "$['results']");
        assert!(matches!(result, Err(ResourceError::Decode { .. })));
    }

    #[test]
    fn decode_corrupt_payload_fails() {
        let algorithm = JsonAlgorithm::new();
        let result = algorithm.decode("{not json", "$");
        assert!(matches!(result, Err(ResourceError::Decode { .. })));
    }

    #[test]
    fn extract_bracket_key_is_literal() {
        let algorithm = JsonAlgorithm::new();
        let record = Record::new(json!({"personName.givenName": "Tom"}));
        let values = algorithm
            .extract(&record, &field("$['personName.givenName']"))
            .unwrap();
        assert_eq!(values, vec!["Tom"]);
    }

    #[test]
    fn extract_dotted_path_navigates() {
        let algorithm = JsonAlgorithm::new();
        let record = Record::new(json!({"person": {"name": "Tom"}}));
        let values = algorithm.extract(&record, &field("$.person.name")).unwrap();
        assert_eq!(values, vec!["Tom"]);
    }

    #[test]
    fn extract_fans_out_over_arrays() {
        let algorithm = JsonAlgorithm::new();
        let record = Record::new(json!({"names": [{"given": "Tom"}, {"given": "Anna"}]}));
        let values = algorithm.extract(&record, &field("$.names.given")).unwrap();
        assert_eq!(values, vec!["Tom", "Anna"]);
    }

    #[test]
    fn extract_missing_field_is_empty_not_error() {
        let algorithm = JsonAlgorithm::new();
        let record = Record::new(json!({"uuid": "abc"}));
        let values = algorithm.extract(&record, &field("$['missing']")).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn extract_malformed_expression_names_the_field() {
        let algorithm = JsonAlgorithm::new();
        let record = Record::new(json!({}));
        let result = algorithm.extract(&record, &field("$['unterminated"));
        match result {
            Err(ResourceError::Extraction { field, .. }) => assert_eq!(field, "test"),
            other => panic!("expected extraction error, got {other:?}"),
        }
    }

    #[test]
    fn extract_numbers_and_bools_stringify() {
        let algorithm = JsonAlgorithm::new();
        let record = Record::new(json!({"age": 42, "active": true}));
        assert_eq!(
            algorithm.extract(&record, &field("$['age']")).unwrap(),
            vec!["42"]
        );
        assert_eq!(
            algorithm.extract(&record, &field("$['active']")).unwrap(),
            vec!["true"]
        );
    }

    #[test]
    fn extract_null_yields_no_value() {
        let algorithm = JsonAlgorithm::new();
        let record = Record::new(json!({"voided": null}));
        let values = algorithm.extract(&record, &field("$['voided']")).unwrap();
        assert!(values.is_empty());
    }
}
