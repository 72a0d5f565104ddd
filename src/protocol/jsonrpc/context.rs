//! Per-call context carrying authorisation checkers.
//!
//! Grounded in `mgmt/rpc/jsonrpc/Context.h`'s `Auth`: an ordered list of
//! checker callables that may veto dispatch before a handler runs. The
//! transport builds one of these fresh per accepted connection, with a
//! checker that inspects the peer's credentials consulted only when the
//! dispatcher is about to run a handler whose options flag `restricted` is
//! true — gating is per-handler at dispatch time, never per-connection at
//! accept time. A host embedding this crate may add further checkers of its
//! own via [`Context::with_additional_checker`].

use std::sync::Arc;

use super::error::{ErrorCode, JsonRpcError, SubError};
use super::types::HandlerOptions;

/// A single authorisation predicate: given the handler's declared options,
/// returns `Some` diagnostic message if the call should be vetoed. `Arc`
/// rather than `Box` so a context can be cheaply extended with one more
/// checker (see [`Context::with_additional_checker`]) without cloning the
/// closures themselves.
pub type Checker = Arc<dyn Fn(&HandlerOptions) -> Option<String> + Send + Sync>;

/// The per-request authorisation context.
#[derive(Clone, Default)]
pub struct Context {
    checkers: Vec<Checker>,
}

impl Context {
    /// An empty context with no checkers installed — every call is allowed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an additional authorisation checker.
    pub fn add_checker<F>(&mut self, checker: F)
    where
        F: Fn(&HandlerOptions) -> Option<String> + Send + Sync + 'static,
    {
        self.checkers.push(Arc::new(checker));
    }

    /// Builds a copy of this context with one more checker appended, leaving
    /// `self` untouched. Used by the transport to layer a per-connection
    /// credential checker onto a shared base context without mutating it.
    pub fn with_additional_checker<F>(&self, checker: F) -> Self
    where
        F: Fn(&HandlerOptions) -> Option<String> + Send + Sync + 'static,
    {
        let mut checkers = self.checkers.clone();
        checkers.push(Arc::new(checker));
        Self { checkers }
    }

    /// Runs every checker against the given handler options. Returns the
    /// wire error for the first checker that vetoes the call, if any.
    pub fn is_blocked(&self, options: &HandlerOptions) -> Option<JsonRpcError> {
        for checker in &self.checkers {
            if let Some(message) = checker(options) {
                return Some(JsonRpcError::with_data(
                    ErrorCode::Unauthorized,
                    vec![SubError::new(ErrorCode::Unauthorized.code(), message)],
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_allows_everything() {
        let ctx = Context::new();
        assert!(ctx.is_blocked(&HandlerOptions { restricted: true }).is_none());
    }

    #[test]
    fn a_vetoing_checker_blocks_restricted_handlers() {
        let mut ctx = Context::new();
        ctx.add_checker(|options| {
            if options.restricted {
                Some("peer is not privileged".to_string())
            } else {
                None
            }
        });
        assert!(ctx.is_blocked(&HandlerOptions { restricted: false }).is_none());
        let blocked = ctx.is_blocked(&HandlerOptions { restricted: true });
        assert_eq!(blocked.unwrap().code, ErrorCode::Unauthorized.code());
    }

    #[test]
    fn with_additional_checker_leaves_the_base_context_untouched() {
        let base = Context::new();
        let derived = base.with_additional_checker(|options| {
            options.restricted.then(|| "not privileged".to_string())
        });
        assert!(base.is_blocked(&HandlerOptions { restricted: true }).is_none());
        assert!(derived.is_blocked(&HandlerOptions { restricted: true }).is_some());
    }
}
