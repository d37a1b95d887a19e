//! JSON parsing helpers for classifier responses
//!
//! Model output often wraps the JSON payload in extra prose or code fences;
//! these helpers cut out the first top-level object before deserializing.

use crate::error::{Error, Result};

use super::types::CategorySuggestion;

/// Parse a category suggestion from a raw model response
pub fn parse_category_suggestion(response: &str) -> Result<CategorySuggestion> {
    let response = response.trim();

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                let truncated = if json_str.len() > 200 {
                    format!("{}...", &json_str[..200])
                } else {
                    json_str.to_string()
                };
                Error::InvalidData(format!(
                    "Invalid JSON from classifier: {} | Raw: {}",
                    e, truncated
                ))
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in classifier response | Raw: {}",
            if response.len() > 200 {
                format!("{}...", &response[..200])
            } else {
                response.to_string()
            }
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suggestion() {
        let response = r#"{"category": "Doprava", "confidence": 0.92}"#;
        let result = parse_category_suggestion(response).unwrap();
        assert_eq!(result.category, "Doprava");
        assert_eq!(result.confidence, 0.92);
    }

    #[test]
    fn test_parse_suggestion_with_text() {
        let response = r#"Sure, here's the classification:
{"category": "Potraviny", "confidence": 0.8}
Hope that helps!"#;
        let result = parse_category_suggestion(response).unwrap();
        assert_eq!(result.category, "Potraviny");
    }

    #[test]
    fn test_parse_suggestion_missing_confidence_defaults() {
        let response = r#"{"category": "Drogéria"}"#;
        let result = parse_category_suggestion(response).unwrap();
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_parse_suggestion_no_json() {
        let response = "Doprava";
        assert!(parse_category_suggestion(response).is_err());
    }
}
