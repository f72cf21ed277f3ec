use serde_json::Value;

/// Parses a JSON object out of model output.
///
/// The whole text is tried first; failing that, the first balanced `{...}`
/// block. Braces inside string literals do not count toward the balance.
pub fn extract_json_object(text: &str) -> Option<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }
    let block = first_balanced_block(text)?;
    match serde_json::from_str::<Value>(block) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn first_balanced_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_object_parses_directly() {
        assert_eq!(extract_json_object(r#" {"a": 1} "#), Some(json!({"a": 1})));
    }

    #[test]
    fn object_embedded_in_prose() {
        let text = "Sure! Here is the result:\n{\"robotModel\": \"UR5\", \"nested\": {\"x\": [1, 2]}}\nLet me know.";
        assert_eq!(
            extract_json_object(text),
            Some(json!({"robotModel": "UR5", "nested": {"x": [1, 2]}}))
        );
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"result: {"citation": "@dataset{x_2024, title={T}}", "doi": "10.1000/1"} trailing }"#;
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["doi"], "10.1000/1");
        assert_eq!(value["citation"], "@dataset{x_2024, title={T}}");
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let text = r#"ok {"note": "say \"}\" here", "n": 2}"#;
        assert_eq!(extract_json_object(text).unwrap()["n"], 2);
    }

    #[test]
    fn unbalanced_or_missing_objects_yield_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{\"a\": 1"), None);
        assert_eq!(extract_json_object("[1, 2, 3]"), None);
    }
}
