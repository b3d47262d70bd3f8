//! Parse LLM output into incident descriptors

use crate::error::ExtractorError;
use sentinel_domain::IncidentDescriptor;
use serde_json::{Map, Value};
use tracing::warn;

/// Parse an LLM JSON response into incident descriptors
///
/// The response must be a JSON array (optionally wrapped in a markdown code
/// block, or in an object under `"incidents"`). Elements are read leniently:
/// missing fields are left empty so that validation downstream can report
/// exactly what was wrong with each one.
pub fn parse_llm_response(response: &str) -> Result<Vec<IncidentDescriptor>, ExtractorError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let incidents = match &json {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("incidents")
            .and_then(Value::as_array)
            .ok_or_else(|| ExtractorError::InvalidFormat("Expected JSON array".to_string()))?,
        _ => return Err(ExtractorError::InvalidFormat("Expected JSON array".to_string())),
    };

    Ok(incidents
        .iter()
        .enumerate()
        .map(|(idx, item)| match item.as_object() {
            Some(obj) => parse_descriptor(obj),
            None => {
                warn!("Incident {} is not a JSON object", idx);
                IncidentDescriptor::default()
            }
        })
        .collect())
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<String, ExtractorError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(ExtractorError::InvalidFormat("Empty code block".to_string()));
        }

        // Skip the opening fence and, when present, the closing one
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        return Ok(lines[1..end].join("\n"));
    }

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    // Prose around the array: take the outermost brackets
    match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if start < end => Ok(trimmed[start..=end].to_string()),
        _ => Err(ExtractorError::InvalidFormat("No JSON array in response".to_string())),
    }
}

fn parse_descriptor(obj: &Map<String, Value>) -> IncidentDescriptor {
    IncidentDescriptor {
        title: string_field(obj, &["title", "headline"]),
        category: string_field(obj, &["category"]),
        severity: first(obj, &["severity"]).and_then(parse_severity),
        confidence: first(obj, &["confidence"]).and_then(parse_confidence),
        summary_en: string_field(obj, &["summary_en", "summary"]),
        key_quote: string_field(obj, &["key_quote", "quote"]),
        article_indices: first(obj, &["article_indices", "articles"])
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_u64().map(|n| n as usize))
                    .collect()
            })
            .unwrap_or_default(),
        evidence_urls: first(obj, &["evidence_urls", "urls", "sources"])
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(url_of).collect())
            .unwrap_or_default(),
    }
}

fn first<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v Value> {
    keys.iter().find_map(|key| obj.get(*key)).filter(|v| !v.is_null())
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    first(obj, keys)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Severity as an integer, a float (rounded) or a numeric string
fn parse_severity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

/// Confidence as a number, a numeric string, or a high/medium/low label
fn parse_confidence(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            match s.as_str() {
                "high" => Some(0.85),
                "medium" => Some(0.5),
                "low" => Some(0.2),
                _ => s.trim_end_matches('%').parse::<f64>().ok(),
            }
        }
        _ => None,
    }
}

/// A source entry is either a URL string or an object with a `url` field
fn url_of(value: &Value) -> Option<String> {
    let url = match value {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str)?,
        _ => return None,
    };
    let url = url.trim();
    (!url.is_empty()).then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json() {
        let response = r#"[
            {
                "title": "Regulator opens probe",
                "category": "Legal",
                "severity": 4,
                "confidence": 0.9,
                "summary_en": "A probe was opened.",
                "key_quote": "opened a probe",
                "article_indices": [0, 2]
            }
        ]"#;

        let descriptors = parse_llm_response(response).unwrap();
        assert_eq!(descriptors.len(), 1);
        let d = &descriptors[0];
        assert_eq!(d.title, "Regulator opens probe");
        assert_eq!(d.category, "Legal");
        assert_eq!(d.severity, Some(4));
        assert_eq!(d.confidence, Some(0.9));
        assert_eq!(d.article_indices, vec![0, 2]);
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = "```json\n[{\"title\": \"t\", \"severity\": \"3\", \"confidence\": \"high\"}]\n```";
        let descriptors = parse_llm_response(response).unwrap();
        assert_eq!(descriptors[0].severity, Some(3));
        assert_eq!(descriptors[0].confidence, Some(0.85));
    }

    #[test]
    fn test_confidence_labels() {
        let response = r#"[
            {"confidence": "HIGH"}, {"confidence": "medium"}, {"confidence": "low"},
            {"confidence": "0.4"}, {"confidence": "unsure"}, {}
        ]"#;
        let confidences: Vec<Option<f64>> = parse_llm_response(response)
            .unwrap()
            .into_iter()
            .map(|d| d.confidence)
            .collect();
        assert_eq!(
            confidences,
            vec![Some(0.85), Some(0.5), Some(0.2), Some(0.4), None, None]
        );
    }

    #[test]
    fn test_severity_forms() {
        let response = r#"[{"severity": 3.6}, {"severity": "2"}, {"severity": "severe"}, {"severity": 9}]"#;
        let severities: Vec<Option<i64>> = parse_llm_response(response)
            .unwrap()
            .into_iter()
            .map(|d| d.severity)
            .collect();
        assert_eq!(severities, vec![Some(4), Some(2), None, Some(9)]);
    }

    #[test]
    fn test_sources_as_objects() {
        let response = r#"[{
            "title": "Probe",
            "summary": "Short.",
            "sources": [{"url": "https://a.example/1", "outlet": "Reuters"}, "https://b.example/2", 7]
        }]"#;
        let d = &parse_llm_response(response).unwrap()[0];
        assert_eq!(d.summary_en, "Short.");
        assert_eq!(d.evidence_urls, vec!["https://a.example/1", "https://b.example/2"]);
    }

    #[test]
    fn test_wrapped_object_and_prose() {
        let wrapped = r#"{"incidents": [{"title": "a"}]}"#;
        assert_eq!(parse_llm_response(wrapped).unwrap().len(), 1);

        let prose = "Here are the incidents:\n[{\"title\": \"b\"}]\nLet me know!";
        assert_eq!(parse_llm_response(prose).unwrap()[0].title, "b");
    }

    #[test]
    fn test_non_object_elements_become_empty_descriptors() {
        let descriptors = parse_llm_response(r#"["oops", {"title": "ok"}]"#).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0], IncidentDescriptor::default());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_llm_response("This is not JSON").is_err());
        assert!(parse_llm_response("[{\"title\": ").is_err());
        assert!(parse_llm_response(r#"{"title": "x"}"#).is_err());
        assert!(parse_llm_response("42").is_err());
    }

    #[test]
    fn test_empty_array() {
        assert!(parse_llm_response("[]").unwrap().is_empty());
    }
}
