//! Wire-exposed error codes and the JSON-RPC error object.
//!
//! The five standard codes (`ParseError` through `InternalError`) come
//! straight from the [JSON-RPC 2.0 spec](https://www.jsonrpc.org/specification#error_object).
//! The small positive-integer codes below them are specific to this
//! service and mirror the discriminants used by the reference
//! implementation's `RpcErrorCode` enum, for wire compatibility.

use serde::{Deserialize, Serialize};

/// Error codes exposed on the wire.
///
/// The negative codes are the JSON-RPC 2.0 standard codes. The small
/// positive codes are per-field decode errors, execution errors, and
/// authorization errors specific to this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Parse error (-32700): the document was not valid JSON.
    ParseError = -32700,

    /// Invalid Request (-32600): well-formed JSON but not a valid request
    /// (empty array, wrong top-level shape, request/handler kind mismatch).
    InvalidRequest = -32600,

    /// Method not found (-32601): no handler registered under this name.
    MethodNotFound = -32601,

    /// Invalid params (-32602): reserved for handler-declared parameter
    /// contracts; never emitted by the engine itself.
    InvalidParams = -32602,

    /// Internal error (-32603): unexpected fault in the engine.
    InternalError = -32603,

    /// `jsonrpc` field present but not equal to `"2.0"`.
    InvalidVersion = 1,

    /// `jsonrpc` field present but not a string.
    InvalidVersionType = 2,

    /// `jsonrpc` field missing.
    MissingVersion = 3,

    /// `method` field present but not a string.
    InvalidMethodType = 4,

    /// `method` field missing.
    MissingMethod = 5,

    /// `params` field present but neither a mapping nor a sequence.
    InvalidParamType = 6,

    /// `id` field present but not a string (and not null — see `NullId`).
    InvalidIdType = 7,

    /// `id` field present and explicitly JSON `null`.
    NullId = 8,

    /// Handler completed but reported failure, or panicked during
    /// invocation.
    ExecutionError = 9,

    /// `id` field present as an empty string.
    EmptyId = 10,

    /// An authorisation checker vetoed the call.
    Unauthorized = 11,
}

impl ErrorCode {
    /// Human-readable description matching the reference implementation's
    /// wording exactly, where one exists.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::InvalidVersion => "Invalid version, 2.0 only",
            ErrorCode::InvalidVersionType => "Invalid version type, should be a string",
            ErrorCode::MissingVersion => "Missing version field",
            ErrorCode::InvalidMethodType => "Invalid method type, should be a string",
            ErrorCode::MissingMethod => "Missing method field",
            ErrorCode::InvalidParamType => "Invalid params type, should be a structure",
            ErrorCode::InvalidIdType => "Invalid id type",
            ErrorCode::NullId => "Use of null as id is discouraged",
            ErrorCode::ExecutionError => "Error during execution",
            ErrorCode::EmptyId => "Empty string is not a valid id",
            ErrorCode::Unauthorized => "Unauthorized",
        }
    }

    /// The integer value written on the wire.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> i32 {
        code as i32
    }
}

/// One sub-error, as carried in a `JsonRpcError`'s `data` array: a
/// handler-reported diagnostic or a plugin's failure detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubError {
    /// Handler-defined error code.
    pub code: i32,
    /// Handler-defined message.
    pub message: String,
}

impl SubError {
    /// Builds a new sub-error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// JSON-RPC error object as defined in the specification, extended with an
/// optional list of sub-errors for handler/plugin diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Structured sub-errors the handler supplied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<SubError>>,
}

impl JsonRpcError {
    /// Creates a new JSON-RPC error with the code's standard description.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.description().to_string(),
            data: None,
        }
    }

    /// Creates a new JSON-RPC error with an overridden message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Creates a new JSON-RPC error carrying structured sub-error data.
    pub fn with_data(code: ErrorCode, data: Vec<SubError>) -> Self {
        Self {
            code: code.code(),
            message: code.description().to_string(),
            data: Some(data),
        }
    }
}
