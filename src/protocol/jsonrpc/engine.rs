//! The Protocol Engine: bytes in, bytes (maybe) out.
//!
//! Grounded in `JsonRPCManager.cc`'s `HandleRequest`: decode the whole
//! incoming buffer, dispatch every element independently of the others'
//! outcomes, then assemble and encode whatever responses resulted. A
//! request made entirely of notifications produces no output bytes at all.

use std::sync::Arc;

use super::codec::{decode, encode, encode_top_level_error};
use super::context::Context;
use super::dispatcher::dispatch;
use super::registry::Registry;
use super::types::{ResponseBatch, ResponseElement};

/// Ties the registry, authorisation context, and codec together into the
/// single entry point a transport calls per inbound message.
pub struct Engine {
    registry: Arc<Registry>,
}

impl Engine {
    /// Builds a new engine around a fresh registry (with its built-in
    /// handlers already registered).
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Builds a new engine around an existing registry, e.g. one a host has
    /// already populated with application-specific handlers.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// The underlying registry, for hosts that need to register handlers
    /// before serving traffic.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Processes one inbound message and returns the bytes to write back,
    /// if any.
    ///
    /// A document-level decode failure (invalid JSON, or a top-level shape
    /// that is neither an object nor a non-empty array) always produces
    /// exactly one error response with no id. Otherwise every element is
    /// dispatched independently; an element that already carries a decode
    /// error skips dispatch entirely and always gets an error response,
    /// copying its id if one was recovered (`None` otherwise — e.g. a
    /// non-object element has no id to copy). The empty-batch case — a
    /// request made entirely of notifications — returns `None`.
    pub fn handle_call(&self, context: &Context, bytes: &[u8]) -> Option<Vec<u8>> {
        let batch = match decode(bytes) {
            Ok(batch) => batch,
            Err(top_level) => return Some(encode_top_level_error(top_level)),
        };

        let mut response = ResponseBatch::new(batch.is_batch);

        for (element, decode_error) in &batch.elements {
            match decode_error {
                Some(error) => {
                    response
                        .elements
                        .push(ResponseElement::failure(element.id.clone(), error.clone()));
                }
                None => {
                    if let Some(resp) = dispatch(&self.registry, context, element) {
                        response.elements.push(resp);
                    }
                }
            }
        }

        if response.is_empty() {
            None
        } else {
            Some(encode(&response))
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
