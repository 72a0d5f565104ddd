//! JSON-RPC 2.0 protocol engine.
//!
//! This module implements the [JSON-RPC 2.0 specification](https://www.jsonrpc.org/specification)
//! as an in-process registry-backed dispatch engine: a codec that decodes
//! bytes into request elements and encodes response elements back to bytes
//! ([`codec`]), a method registry mapping names to handlers ([`registry`]),
//! a per-request authorisation context ([`context`]), a plugin-method
//! rendezvous for out-of-band completion ([`plugin`]), the dispatch
//! algorithm tying the above together for one request element
//! ([`dispatcher`]), and the top-level [`engine::Engine`] that a transport
//! calls once per inbound message.
//!
//! Request `id`s in this service are restricted to strings: the usual
//! JSON-RPC `string | number | null` union is narrowed because a numeric or
//! null id is rejected as a decode error rather than accepted (see
//! [`error::ErrorCode::NullId`]).

pub mod codec;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod types;

pub use context::Context;
pub use engine::Engine;
pub use error::{ErrorCode, JsonRpcError, SubError};
pub use registry::{HandlerKind, Registry};
pub use types::{RequestBatch, RequestElement, ResponseBatch, ResponseElement};
