//! Protocol error module.
//!
//! This module defines errors that may occur while decoding, validating, or
//! dispatching a JSON-RPC 2.0 message. These are distinct from the wire-level
//! [`crate::protocol::jsonrpc::error::ErrorCode`], which is what actually gets
//! serialised back to the caller; values here are the internal `Result` error
//! type returned by fallible functions before they are translated to a wire
//! error.

use thiserror::Error;

/// Errors that can occur during JSON-RPC decode/dispatch operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The document could not be parsed as JSON at all.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The top-level JSON shape was neither an object nor a non-empty array.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No handler is registered under the requested method name.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// A handler of this name exists but its kind (method/notification/plugin)
    /// does not match the shape of the incoming request.
    #[error("Request/handler kind mismatch for method: {0}")]
    KindMismatch(String),

    /// An authorisation checker vetoed the call.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The handler ran and reported failure, or panicked during invocation.
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// A plugin handler never called the completion API.
    #[error("Plugin handler did not deposit a result")]
    PluginNeverCompleted,

    /// Other protocol errors.
    #[error("Protocol error: {0}")]
    Other(String),
}
