//! Query and form parameter scanning
//!
//! The aggregated parameter set visible to handlers is merged in three
//! stages (path params, then query params, then form params) with each
//! later stage overwriting an earlier one on exact key collision. The merge
//! itself is a plain map extend performed by the dispatcher; this module
//! owns the two scanners.

use std::collections::HashMap;

use http::HeaderMap;
use http::header::CONTENT_TYPE;

/// Content type that triggers form-field scanning
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Scan a raw query string for `key=value` pairs separated by `&`.
///
/// Values are kept verbatim (no percent-decoding). Segments without a `=`
/// are skipped; a segment with multiple `=` contributes only its first two
/// parts. Whenever this scanner runs, i.e. whenever the request target
/// carried a `?`, a synthetic `param=1` entry is added so handlers can
/// detect that a query string was present at all.
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in query.split('&') {
        let mut parts = pair.split('=');
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        params.insert(key.to_string(), value.to_string());
    }

    params.insert("param".to_string(), "1".to_string());
    params
}

/// Scan a urlencoded form body.
///
/// Keys and values are percent-decoded (`+` as space). For a field submitted
/// more than once only the first value is kept.
pub fn parse_form_params(body: &[u8]) -> HashMap<String, String> {
    let raw = String::from_utf8_lossy(body);
    let mut params = HashMap::new();

    for pair in raw.split('&') {
        let mut parts = pair.split('=');
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        params
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }

    params
}

/// Whether the request carries a urlencoded form body
pub fn is_form_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE))
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_query_pairs_and_synthetic_param() {
        let params = parse_query_params("a=1&b=2");
        assert_eq!(params.get("a").map(String::as_str), Some("1"));
        assert_eq!(params.get("b").map(String::as_str), Some("2"));
        assert_eq!(params.get("param").map(String::as_str), Some("1"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_empty_query_still_marks_presence() {
        let params = parse_query_params("");
        assert_eq!(params.get("param").map(String::as_str), Some("1"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_query_segment_without_equals_is_skipped() {
        let params = parse_query_params("flag&a=1");
        assert!(!params.contains_key("flag"));
        assert_eq!(params.get("a").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_query_values_stay_raw() {
        let params = parse_query_params("name=hello%20world");
        assert_eq!(
            params.get("name").map(String::as_str),
            Some("hello%20world")
        );
    }

    #[test]
    fn test_query_duplicate_key_last_wins() {
        let params = parse_query_params("a=1&a=2");
        assert_eq!(params.get("a").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_form_first_value_wins() {
        let params = parse_form_params(b"color=red&color=blue");
        assert_eq!(params.get("color").map(String::as_str), Some("red"));
    }

    #[test]
    fn test_form_values_are_decoded() {
        let params = parse_form_params(b"greeting=hello+world&path=%2Ftmp");
        assert_eq!(
            params.get("greeting").map(String::as_str),
            Some("hello world")
        );
        assert_eq!(params.get("path").map(String::as_str), Some("/tmp"));
    }

    #[test]
    fn test_form_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_form_content_type(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        assert!(is_form_content_type(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"),
        );
        assert!(is_form_content_type(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_form_content_type(&headers));
    }
}
