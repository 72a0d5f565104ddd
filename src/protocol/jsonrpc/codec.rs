//! The codec boundary: decode bytes into a [`RequestBatch`], encode a
//! [`ResponseBatch`] into bytes.
//!
//! The decoder and encoder are the only place that knows the wire is JSON;
//! everything above this module works on [`RequestElement`]/
//! [`ResponseElement`]. Swapping the underlying JSON library only requires
//! preserving the shapes in `super::types`. The parser does not need to be
//! YAML-aware even though the reference implementation's codec accepts a
//! YAML superset, because valid JSON is a subset of YAML.

use serde_json::Value;

use super::error::{ErrorCode, JsonRpcError};
use super::types::{RequestBatch, RequestElement, ResponseBatch};

/// A document-level decode failure: either the bytes were not valid JSON at
/// all, or the top-level shape was not a valid request container. Both
/// cases produce one response with no id.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelError(pub JsonRpcError);

/// Decodes a byte string into a request batch.
///
/// Per-element field errors never abort the batch — see
/// [`decode_element`]. Only a document-level parse failure or an invalid
/// top-level shape short-circuits to a `TopLevelError`.
pub fn decode(bytes: &[u8]) -> Result<RequestBatch, TopLevelError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|_| TopLevelError(JsonRpcError::new(ErrorCode::ParseError)))?;

    match document {
        Value::Object(_) => {
            let (element, error) = decode_element(&document);
            Ok(RequestBatch::single(element, error))
        }
        Value::Array(ref items) if !items.is_empty() => {
            let elements = items
                .iter()
                .map(|item| decode_element(item))
                .collect::<Vec<_>>();
            Ok(RequestBatch::batch(elements))
        }
        _ => Err(TopLevelError(JsonRpcError::new(ErrorCode::InvalidRequest))),
    }
}

/// Extracts one request element from a single JSON value, recording at most
/// one field error (the first detected) while still populating every field
/// it could.
fn decode_element(value: &Value) -> (RequestElement, Option<JsonRpcError>) {
    let mut element = RequestElement::default();

    let Some(obj) = value.as_object() else {
        return (element, Some(JsonRpcError::new(ErrorCode::InvalidRequest)));
    };

    let mut error = None;

    match obj.get("jsonrpc") {
        None => {
            error.get_or_insert(JsonRpcError::new(ErrorCode::MissingVersion));
        }
        Some(Value::String(v)) if v == "2.0" => {
            element.jsonrpc = Some(v.clone());
        }
        Some(Value::String(v)) => {
            element.jsonrpc = Some(v.clone());
            error.get_or_insert(JsonRpcError::new(ErrorCode::InvalidVersion));
        }
        Some(_) => {
            error.get_or_insert(JsonRpcError::new(ErrorCode::InvalidVersionType));
        }
    }

    match obj.get("method") {
        None => {
            error.get_or_insert(JsonRpcError::new(ErrorCode::MissingMethod));
        }
        Some(Value::String(v)) => {
            element.method = Some(v.clone());
        }
        Some(_) => {
            error.get_or_insert(JsonRpcError::new(ErrorCode::InvalidMethodType));
        }
    }

    match obj.get("id") {
        None => {}
        Some(Value::Null) => {
            error.get_or_insert(JsonRpcError::new(ErrorCode::NullId));
        }
        Some(Value::String(s)) if s.is_empty() => {
            error.get_or_insert(JsonRpcError::new(ErrorCode::EmptyId));
        }
        Some(Value::String(s)) => {
            element.id = Some(s.clone());
        }
        Some(_) => {
            error.get_or_insert(JsonRpcError::new(ErrorCode::InvalidIdType));
        }
    }

    match obj.get("params") {
        None => {}
        Some(v @ Value::Object(_)) | Some(v @ Value::Array(_)) => {
            element.params = Some(v.clone());
        }
        Some(_) => {
            error.get_or_insert(JsonRpcError::new(ErrorCode::InvalidParamType));
        }
    }

    (element, error)
}

/// Encodes a top-level decode failure into its one-off response body.
pub fn encode_top_level_error(error: TopLevelError) -> Vec<u8> {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "error": error.0,
    });
    serde_json::to_vec(&body).expect("response object is always serializable")
}

/// Encodes a response batch: a single JSON object if `is_batch` is false,
/// a JSON array otherwise. The id, when present, is written last; when
/// absent it is omitted entirely rather than written as `null`.
pub fn encode(batch: &ResponseBatch) -> Vec<u8> {
    let values: Vec<Value> = batch.elements.iter().map(encode_element).collect();

    let document = if batch.is_batch {
        Value::Array(values)
    } else {
        values
            .into_iter()
            .next()
            .unwrap_or_else(|| Value::Object(Default::default()))
    };

    serde_json::to_vec(&document).expect("response document is always serializable")
}

fn encode_element(element: &super::types::ResponseElement) -> Value {
    let mut map = serde_json::Map::new();
    map.insert("jsonrpc".to_string(), Value::String(element.jsonrpc.to_string()));

    match &element.outcome {
        super::types::Outcome::Result(result) => {
            map.insert("result".to_string(), result.clone());
        }
        super::types::Outcome::Error(error) => {
            map.insert(
                "error".to_string(),
                serde_json::to_value(error).expect("JsonRpcError is always serializable"),
            );
        }
    }

    if let Some(id) = &element.id {
        map.insert("id".to_string(), Value::String(id.clone()));
    }

    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::jsonrpc::types::{Outcome, ResponseElement};
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(br#"{"method":"m","id":"1"}"#, ErrorCode::MissingVersion; "missing jsonrpc")]
    #[test_case(br#"{"jsonrpc":"1.0","method":"m","id":"1"}"#, ErrorCode::InvalidVersion; "wrong jsonrpc value")]
    #[test_case(br#"{"jsonrpc":2.0,"method":"m","id":"1"}"#, ErrorCode::InvalidVersionType; "non-string jsonrpc")]
    #[test_case(br#"{"jsonrpc":"2.0","id":"1"}"#, ErrorCode::MissingMethod; "missing method")]
    #[test_case(br#"{"jsonrpc":"2.0","method":7,"id":"1"}"#, ErrorCode::InvalidMethodType; "non-string method")]
    #[test_case(br#"{"jsonrpc":"2.0","method":"m","id":null}"#, ErrorCode::NullId; "null id")]
    #[test_case(br#"{"jsonrpc":"2.0","method":"m","id":""}"#, ErrorCode::EmptyId; "empty string id")]
    #[test_case(br#"{"jsonrpc":"2.0","method":"m","id":7}"#, ErrorCode::InvalidIdType; "non-string id")]
    #[test_case(br#"{"jsonrpc":"2.0","method":"m","id":"1","params":"nope"}"#, ErrorCode::InvalidParamType; "non-container params")]
    fn single_field_decode_errors(bytes: &[u8], expected: ErrorCode) {
        let batch = decode(bytes).unwrap();
        let (_, error) = &batch.elements[0];
        assert_eq!(error.as_ref().unwrap().code, expected.code());
    }

    proptest! {
        /// Any method name the strategy can produce round-trips through the
        /// decoder untouched, with no method-related decode error.
        #[test]
        fn any_well_formed_method_name_decodes_cleanly(
            method in crate::tests::jsonrpc_method_strategy(),
        ) {
            let document = serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "id": "1",
            });
            let batch = decode(document.to_string().as_bytes()).unwrap();
            let (element, error) = &batch.elements[0];
            prop_assert!(error.is_none());
            prop_assert_eq!(element.method.as_deref(), Some(method.as_str()));
        }

        /// Any non-empty string the strategy can produce is accepted as an
        /// `id` verbatim; an empty string is the one value that strategy
        /// can emit that the codec rejects (`EmptyId`).
        #[test]
        fn any_string_id_either_round_trips_or_is_rejected_as_empty(
            id in crate::tests::string_strategy(32),
        ) {
            let document = serde_json::json!({
                "jsonrpc": "2.0",
                "method": "m",
                "id": id,
            });
            let batch = decode(document.to_string().as_bytes()).unwrap();
            let (element, error) = &batch.elements[0];
            if id.is_empty() {
                prop_assert_eq!(error.as_ref().map(|e| e.code), Some(ErrorCode::EmptyId.code()));
            } else {
                prop_assert!(error.is_none());
                prop_assert_eq!(element.id.as_deref(), Some(id.as_str()));
            }
        }
    }

    #[test]
    fn decodes_a_valid_single_request() {
        let batch = decode(br#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":"1"}"#)
            .unwrap();
        assert!(!batch.is_batch);
        let (element, error) = &batch.elements[0];
        assert!(error.is_none());
        assert_eq!(element.method.as_deref(), Some("subtract"));
        assert_eq!(element.id.as_deref(), Some("1"));
    }

    #[test]
    fn parse_failure_yields_top_level_error() {
        let err = decode(br#"{"jsonrpc":"2.0","method":"foobar, "params":"bar","baz]"#).unwrap_err();
        assert_eq!(err.0.code, -32700);
    }

    #[test]
    fn empty_array_is_invalid_request() {
        let err = decode(b"[]").unwrap_err();
        assert_eq!(err.0.code, -32600);
    }

    #[test]
    fn missing_version_is_recorded_without_aborting_batch() {
        let batch = decode(br#"[{"method":"m","id":"1"},{"jsonrpc":"2.0","method":"n"}]"#).unwrap();
        assert!(batch.is_batch);
        assert_eq!(batch.elements.len(), 2);
        assert_eq!(batch.elements[0].1.as_ref().unwrap().code, 3);
        assert!(batch.elements[1].1.is_none());
    }

    #[test]
    fn encode_omits_absent_id_entirely() {
        let mut batch = ResponseBatch::new(false);
        batch.elements.push(ResponseElement {
            jsonrpc: "2.0",
            id: None,
            outcome: Outcome::Error(JsonRpcError::new(ErrorCode::ParseError)),
        });
        let bytes = encode(&batch);
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("\"id\""));
    }

    #[test]
    fn encode_batch_wraps_in_array() {
        let mut batch = ResponseBatch::new(true);
        batch
            .elements
            .push(ResponseElement::success(Some("1".to_string()), serde_json::json!("19")));
        let bytes = encode(&batch);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with('['));
    }
}
