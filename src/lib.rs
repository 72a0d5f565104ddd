//! RPCd: an in-process JSON-RPC 2.0 management service.
//!
//! This library provides a registry-backed JSON-RPC 2.0 protocol engine and
//! a Unix-domain-socket transport for exposing an application's management
//! surface to local tooling. It is designed to be embedded by a host binary,
//! but the engine itself has no dependency on any particular transport.
//!
//! # Architecture
//!
//! - [`protocol::jsonrpc`] — the wire codec, method registry, dispatcher,
//!   and protocol engine. Entirely synchronous: one call in, zero or one
//!   response out.
//! - [`transport`] — the Unix-domain-socket listener, single worker thread,
//!   and single-instance file lock.
//! - [`server`] — lifecycle glue tying a transport to a running thread.
//! - [`client`] — a synchronous client helper for talking to the socket.
//! - [`config`] — layered configuration (file + environment) for the above.
//! - [`error`] — the aggregate error types and the pluggable error reporter.

// Re-export public modules
pub mod accumulator;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version information for the RPCd library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization: installs the tracing-backed error reporter and
/// loads the default configuration as the global configuration.
pub fn init() -> error::RpcdResult<()> {
    error::set_error_reporter(std::sync::Arc::new(error::TracingErrorReporter));
    config::init_default_config()?;
    Ok(())
}
