//! JSON job-board API payloads.
//!
//! Two shapes are accepted: a bare array of postings (Lever's
//! `/v0/postings/{site}`) or an object wrapping the array in a named field
//! (`data`, or `jobs` as served by Greenhouse's board API). Each shape has
//! its own field mapping. Anything else yields no postings.

use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::models::Posting;

/// The accepted top-level shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiPayload {
    List(Vec<Value>),
    Wrapped {
        #[serde(alias = "jobs")]
        data: Vec<Value>,
    },
}

/// Fields read from a single element; missing or non-string fields are empty.
#[derive(Debug, Default)]
struct ApiItem {
    text: Option<String>,
    title: Option<String>,
    role: Option<String>,
    hosted_url: Option<String>,
    apply_url: Option<String>,
    absolute_url: Option<String>,
}

impl ApiItem {
    fn from_object(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            text: field("text"),
            title: field("title"),
            role: field("role"),
            hosted_url: field("hostedUrl"),
            apply_url: field("applyUrl"),
            absolute_url: field("absolute_url"),
        }
    }

    /// Mapping for bare arrays: `text|title|role`, `hostedUrl|applyUrl`.
    fn into_list_posting(self) -> Posting {
        Posting::new(
            first_of([self.text, self.title, self.role]),
            first_of([self.hosted_url, self.apply_url]),
        )
    }

    /// Mapping for wrapped arrays: `text|title`, `applyUrl|hostedUrl|absolute_url`.
    fn into_wrapped_posting(self) -> Posting {
        Posting::new(
            first_of([self.text, self.title]),
            first_of([self.apply_url, self.hosted_url, self.absolute_url]),
        )
    }
}

fn first_of<const N: usize>(candidates: [Option<String>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Map a JSON body into postings.
///
/// A body that is not JSON at all is a [`AppError::ParseError`]; valid JSON
/// of an unexpected shape is `Ok(vec![])`.
pub fn parse_api_payload(body: &str) -> Result<Vec<Posting>, AppError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::ParseError(format!("Response body is not valid JSON: {e}")))?;

    let Ok(payload) = serde_json::from_value::<ApiPayload>(value) else {
        tracing::debug!("Unrecognized API payload shape, returning no postings");
        return Ok(Vec::new());
    };

    let postings = match payload {
        ApiPayload::List(items) => items
            .into_iter()
            .filter_map(item)
            .map(ApiItem::into_list_posting)
            .collect::<Vec<_>>(),
        ApiPayload::Wrapped { data } => data
            .into_iter()
            .filter_map(item)
            .map(ApiItem::into_wrapped_posting)
            .collect(),
    };

    Ok(postings.into_iter().filter(|p| !p.is_blank()).collect())
}

/// Elements that are not objects are skipped.
fn item(value: Value) -> Option<ApiItem> {
    value.is_object().then(|| ApiItem::from_object(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_data_payload() {
        let body = r#"{ "data": [{"text":"Engineer","applyUrl":"https://x/3"}] }"#;
        assert_eq!(
            parse_api_payload(body).unwrap(),
            vec![Posting::new("Engineer", "https://x/3")]
        );
    }

    #[test]
    fn test_lever_list_payload() {
        let body = r#"[
            {"id":"1","text":"Backend Engineer","hostedUrl":"https://jobs.lever.co/acme/1","applyUrl":"https://jobs.lever.co/acme/1/apply"},
            {"id":"2","title":"Designer","applyUrl":"https://jobs.lever.co/acme/2/apply"},
            {"id":"3","role":"Recruiter"}
        ]"#;
        assert_eq!(
            parse_api_payload(body).unwrap(),
            vec![
                Posting::new("Backend Engineer", "https://jobs.lever.co/acme/1"),
                Posting::new("Designer", "https://jobs.lever.co/acme/2/apply"),
                Posting::new("Recruiter", ""),
            ]
        );
    }

    #[test]
    fn test_greenhouse_jobs_payload() {
        let body = r#"{"jobs":[{"id":42,"title":"SRE","absolute_url":"https://boards.greenhouse.io/acme/jobs/42"}],"meta":{"total":1}}"#;
        assert_eq!(
            parse_api_payload(body).unwrap(),
            vec![Posting::new("SRE", "https://boards.greenhouse.io/acme/jobs/42")]
        );
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let body = r#"{"data":[{"text":"Engineer"},{"applyUrl":"https://x/9"}]}"#;
        assert_eq!(
            parse_api_payload(body).unwrap(),
            vec![Posting::new("Engineer", ""), Posting::new("", "https://x/9")]
        );
    }

    #[test]
    fn test_blank_and_non_object_elements_skipped() {
        let body = r#"[{"id":"1"}, "stray", 7, {"text":"Kept","hostedUrl":"https://x/1"}, {"text": 5}]"#;
        assert_eq!(
            parse_api_payload(body).unwrap(),
            vec![Posting::new("Kept", "https://x/1")]
        );
    }

    #[test]
    fn test_mistyped_fields_do_not_drop_element() {
        let body = r#"[
            {"text":"Welder","role":{"level":"senior"},"hostedUrl":"https://x/w"},
            {"text":5,"title":"Painter","applyUrl":["https://x/a"],"hostedUrl":"https://x/p"}
        ]"#;
        assert_eq!(
            parse_api_payload(body).unwrap(),
            vec![
                Posting::new("Welder", "https://x/w"),
                Posting::new("Painter", "https://x/p"),
            ]
        );
    }

    #[test]
    fn test_unexpected_shape_is_empty() {
        assert!(parse_api_payload(r#"{"results":[{"text":"x"}]}"#).unwrap().is_empty());
        assert!(parse_api_payload(r#"{"data":"nope"}"#).unwrap().is_empty());
        assert!(parse_api_payload("42").unwrap().is_empty());
        assert!(parse_api_payload("null").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_api_payload("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }
}
