//! Protocol layer: the JSON-RPC 2.0 engine.

pub mod jsonrpc;

pub use self::jsonrpc::engine::Engine;
