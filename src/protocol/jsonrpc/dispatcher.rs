//! Dispatch of a single decoded request element against the [`Registry`].
//!
//! Grounded in `JsonRPCManager.cc`'s `HandleSingleRequest`: look the method
//! up, check its kind against the request shape (id present vs. absent),
//! run it through the [`Context`]'s authorisation checkers, then invoke it —
//! notifications inline and fire-forget, methods inline with their result
//! captured, plugin methods fired then awaited on the shared
//! [`Rendezvous`].

use super::context::Context;
use super::error::{ErrorCode, JsonRpcError};
use super::registry::{
    invoke_method_catching_panics, invoke_notification_catching_panics, HandlerKind, Invocation,
    Registry,
};
use super::types::{RequestElement, ResponseElement};

/// Dispatches one already-decoded, already-error-free request element.
///
/// Returns `None` for a successfully dispatched notification (no response is
/// ever produced for one) and `Some(_)` for everything else: a method call's
/// result/error, or a dispatch-time error (method not found, kind mismatch,
/// unauthorized).
pub fn dispatch(
    registry: &Registry,
    context: &Context,
    element: &RequestElement,
) -> Option<ResponseElement> {
    let method = element
        .method
        .as_deref()
        .expect("dispatch is only called on elements with no decode error");

    tracing::trace!(method, id = element.id.as_deref(), "dispatching request element");

    let Some(record) = registry.lookup(method) else {
        return if element.is_notification() {
            None
        } else {
            Some(ResponseElement::failure(
                element.id.clone(),
                JsonRpcError::new(ErrorCode::MethodNotFound),
            ))
        };
    };

    if element.is_notification() {
        if !record.kind.accepts_notification() {
            // A notification naming a method-only handler is silently
            // dropped: there is no id to carry a response back to.
            return None;
        }
        if context.is_blocked(&record.options).is_some() {
            return None;
        }
        match &record.kind {
            HandlerKind::Notification(f) => {
                invoke_notification_catching_panics(f, element.params.as_ref());
            }
            _ => unreachable!("accepts_notification implies the Notification variant"),
        }
        return None;
    }

    if !record.kind.accepts_method_call() {
        return Some(ResponseElement::failure(
            element.id.clone(),
            JsonRpcError::new(ErrorCode::InvalidRequest),
        ));
    }

    if let Some(error) = context.is_blocked(&record.options) {
        return Some(ResponseElement::failure(element.id.clone(), error));
    }

    let id = element.id.clone().expect("method call always has an id");
    let result = match &record.kind {
        HandlerKind::Method(f) => invoke_method_catching_panics(f, &id, element.params.as_ref()),
        HandlerKind::PluginMethod(f) => {
            f(&id, element.params.as_ref());
            Invocation::Completed(registry.rendezvous().wait_for_result())
        }
        HandlerKind::Notification(_) => unreachable!("accepts_method_call excludes Notification"),
    };

    Some(match result {
        Invocation::Completed(Ok(value)) => ResponseElement::success(Some(id), value),
        Invocation::Completed(Err(sub_errors)) => ResponseElement::failure(
            Some(id),
            JsonRpcError::with_data(ErrorCode::ExecutionError, sub_errors),
        ),
        Invocation::Panicked => {
            tracing::warn!(method, id = %id, "handler panicked during invocation");
            ResponseElement::failure(Some(id), JsonRpcError::new(ErrorCode::ExecutionError))
        }
    })
}
