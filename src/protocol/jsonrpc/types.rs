//! Core data types for one JSON-RPC 2.0 message: request/response elements
//! and the batches that wrap them.
//!
//! Unlike a general-purpose JSON-RPC client library, this core restricts
//! `id` to a string (or absent) rather than the usual string/number/null
//! union: the decoder maps a numeric or null id to a decode error rather
//! than accepting it, per the wire contract this service exposes.

use serde_json::Value;

use super::error::JsonRpcError;

/// A single decoded (or partially-decoded) request element.
///
/// Every field is optional because the decoder still returns an element with
/// as many fields populated as it could extract even when a decode error was
/// recorded against it — this lets the encoder echo back a valid `id` even
/// when, say, `jsonrpc` was missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestElement {
    /// The `jsonrpc` field, if present and a string.
    pub jsonrpc: Option<String>,

    /// The `method` field, if present and a string.
    pub method: Option<String>,

    /// The `id` field, if present and a non-null string. A JSON `null` or
    /// non-string id is a decode error, not folded in here.
    pub id: Option<String>,

    /// The `params` field, if present and a mapping or sequence.
    pub params: Option<Value>,
}

impl RequestElement {
    /// A request element with no decode error is a notification iff it has
    /// no id.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// An ordered sequence of (request element, decode error) pairs plus the
/// batch flag decided by the top-level shape of the decoded document.
#[derive(Debug, Clone, Default)]
pub struct RequestBatch {
    /// Every element of the batch paired with its decode error, if any.
    pub elements: Vec<(RequestElement, Option<JsonRpcError>)>,

    /// `false` for a single JSON object, `true` for a non-empty JSON array.
    pub is_batch: bool,
}

impl RequestBatch {
    /// Builds a non-batch (single-object) request batch from one element.
    pub fn single(element: RequestElement, error: Option<JsonRpcError>) -> Self {
        Self {
            elements: vec![(element, error)],
            is_batch: false,
        }
    }

    /// Builds a batch (array) request batch from its elements.
    pub fn batch(elements: Vec<(RequestElement, Option<JsonRpcError>)>) -> Self {
        Self {
            elements,
            is_batch: true,
        }
    }
}

/// The outcome of one handler invocation: either a result value or an
/// error. Never both — see [`ResponseElement`]'s invariant.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A successful result value.
    Result(Value),
    /// An error, with its code/message/optional sub-error data.
    Error(JsonRpcError),
}

/// One response element: protocol version, optional echoed id, and exactly
/// one of a result or an error.
#[derive(Debug, Clone)]
pub struct ResponseElement {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,

    /// Copied from the request if it was present and valid; absent for
    /// notifications and for decode errors where no id could be extracted.
    pub id: Option<String>,

    /// The result or error payload.
    pub outcome: Outcome,
}

impl ResponseElement {
    /// Builds a successful response element.
    pub fn success(id: Option<String>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Builds an error response element.
    pub fn failure(id: Option<String>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            outcome: Outcome::Error(error),
        }
    }
}

/// An ordered sequence of response elements plus the batch flag, preserved
/// from the request so single-object input yields single-object output and
/// array input yields array output.
#[derive(Debug, Clone, Default)]
pub struct ResponseBatch {
    /// The response elements, in dispatch (= request) order.
    pub elements: Vec<ResponseElement>,

    /// Mirrors the request batch's `is_batch` flag.
    pub is_batch: bool,
}

impl ResponseBatch {
    /// A batch with the given `is_batch` flag and no elements yet.
    pub fn new(is_batch: bool) -> Self {
        Self {
            elements: Vec::new(),
            is_batch,
        }
    }

    /// True when there is nothing to send back (pure notification traffic).
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Per-handler metadata recorded at registration time.
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    /// When true, callers lacking sufficient privilege are rejected before
    /// invocation.
    pub restricted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_has_no_id() {
        let el = RequestElement {
            jsonrpc: Some("2.0".to_string()),
            method: Some("m".to_string()),
            id: None,
            params: None,
        };
        assert!(el.is_notification());
    }

    #[test]
    fn method_call_has_an_id() {
        let el = RequestElement {
            jsonrpc: Some("2.0".to_string()),
            method: Some("m".to_string()),
            id: Some("1".to_string()),
            params: None,
        };
        assert!(!el.is_notification());
    }

    #[test]
    fn response_batch_empty_means_no_output() {
        let batch = ResponseBatch::new(true);
        assert!(batch.is_empty());
    }
}
