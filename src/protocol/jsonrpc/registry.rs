//! The method-name → handler-record registry.
//!
//! Grounded in `JsonRPCManager.h`'s `Dispatcher`: a single
//! `unordered_map<string, InternalHandler>` guarded by one mutex, with a
//! tagged-union handler wrapper (`std::variant`) rather than virtual
//! dispatch. Here the tagged union is [`HandlerKind`], and the table is a
//! `parking_lot::Mutex<HashMap<..>>` rather than `std::sync::Mutex` —
//! matching this crate's existing choice of `parking_lot` for the plugin
//! rendezvous condvar.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::plugin::{JsonRpcResult, Rendezvous};
use super::types::HandlerOptions;

/// A synchronous method handler: `(id, params) -> (result | (message,
/// sub-errors))`. Runs inline on the dispatcher's thread.
pub type MethodFn = Arc<dyn Fn(&str, Option<&Value>) -> JsonRpcResult + Send + Sync>;

/// A synchronous notification handler: `(params) -> ()`. Any panic is
/// swallowed; the call never produces a response either way.
pub type NotificationFn = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// A plugin-method handler: `(id, params) -> ()`. Fires the plugin's
/// out-of-band work and returns immediately; the dispatcher then blocks on
/// the shared [`Rendezvous`] until the plugin calls
/// [`Rendezvous::deposit`].
pub type PluginMethodFn = Arc<dyn Fn(&str, Option<&Value>) + Send + Sync>;

/// The tagged union of handler kinds a name can be registered under.
#[derive(Clone)]
pub enum HandlerKind {
    /// Synchronous method call handler.
    Method(MethodFn),
    /// Fire-and-forget notification handler.
    Notification(NotificationFn),
    /// Plugin-method handler requiring a rendezvous wait.
    PluginMethod(PluginMethodFn),
}

impl HandlerKind {
    /// Whether this kind accepts a method-call request (has an id).
    pub fn accepts_method_call(&self) -> bool {
        matches!(self, HandlerKind::Method(_) | HandlerKind::PluginMethod(_))
    }

    /// Whether this kind accepts a notification request (no id).
    pub fn accepts_notification(&self) -> bool {
        matches!(self, HandlerKind::Notification(_))
    }

    /// A short name used by introspection (`get_service_descriptor`).
    pub fn type_name(&self) -> &'static str {
        match self {
            HandlerKind::Method(_) | HandlerKind::PluginMethod(_) => "method",
            HandlerKind::Notification(_) => "notification",
        }
    }
}

/// One registered handler: its callable, options, and an optional
/// provider-info string used for introspection.
#[derive(Clone)]
pub struct HandlerRecord {
    /// The callable, tagged by kind.
    pub kind: HandlerKind,
    /// Declared options (currently just `restricted`).
    pub options: HandlerOptions,
    /// Human-readable description of who registered this handler.
    pub provider: Option<String>,
}

/// The method registry: a single-mutex-guarded name → record map.
pub struct Registry {
    handlers: Mutex<HashMap<String, HandlerRecord>>,
    rendezvous: Rendezvous,
}

impl Registry {
    /// Builds a new registry with the two always-present built-in
    /// handlers (`show_registered_handlers`, `get_service_descriptor`)
    /// already installed, both non-restricted.
    pub fn new() -> Arc<Self> {
        let registry = Arc::new(Self {
            handlers: Mutex::new(HashMap::new()),
            rendezvous: Rendezvous::new(),
        });
        registry.register_builtins();
        registry
    }

    fn register_builtins(self: &Arc<Self>) {
        let for_list = Arc::clone(self);
        let inserted = self.register(
            "show_registered_handlers",
            HandlerKind::Method(Arc::new(move |_id, _params| {
                Ok(for_list.show_registered_handlers())
            })),
            Some("core".to_string()),
            HandlerOptions { restricted: false },
        );
        if !inserted {
            tracing::warn!("show_registered_handlers collided with a pre-existing handler");
        }

        let for_descriptor = Arc::clone(self);
        let inserted = self.register(
            "get_service_descriptor",
            HandlerKind::Method(Arc::new(move |_id, _params| {
                Ok(for_descriptor.get_service_descriptor())
            })),
            Some("core".to_string()),
            HandlerOptions { restricted: false },
        );
        if !inserted {
            tracing::warn!("get_service_descriptor collided with a pre-existing handler");
        }
    }

    /// Inserts the handler iff the name is not already present. Returns
    /// `true` on insert, `false` if the name was already taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        kind: HandlerKind,
        provider: Option<String>,
        options: HandlerOptions,
    ) -> bool {
        use std::collections::hash_map::Entry;
        let name = name.into();
        let mut handlers = self.handlers.lock();
        match handlers.entry(name) {
            Entry::Occupied(entry) => {
                tracing::warn!(name = %entry.key(), "handler name already registered");
                false
            }
            Entry::Vacant(slot) => {
                tracing::debug!(name = %slot.key(), "registered handler");
                slot.insert(HandlerRecord {
                    kind,
                    options,
                    provider,
                });
                true
            }
        }
    }

    /// Looks up a handler record by name. Cloning the record (an `Arc`
    /// underneath each callable variant) releases the lock before the
    /// caller invokes it, satisfying the "never hold the registry mutex
    /// during a handler call" invariant.
    pub fn lookup(&self, name: &str) -> Option<HandlerRecord> {
        self.handlers.lock().get(name).cloned()
    }

    /// Removes a handler. Test/administration only in production use.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.handlers.lock().remove(name).is_some();
        if removed {
            tracing::debug!(name, "removed handler");
        }
        removed
    }

    /// Lists every registered handler as `(name, kind, provider,
    /// restricted)`.
    pub fn enumerate(&self) -> Vec<(String, &'static str, Option<String>, bool)> {
        self.handlers
            .lock()
            .iter()
            .map(|(name, record)| {
                (
                    name.clone(),
                    record.kind.type_name(),
                    record.provider.clone(),
                    record.options.restricted,
                )
            })
            .collect()
    }

    /// The shared plugin-completion rendezvous used by plugin-method
    /// handlers. Exposed so the dispatcher can wait on it and a host can
    /// hand plugins the completion function.
    pub fn rendezvous(&self) -> &Rendezvous {
        &self.rendezvous
    }

    fn show_registered_handlers(&self) -> Value {
        let mut methods = Vec::new();
        let mut notifications = Vec::new();
        for (name, kind, _, _) in self.enumerate() {
            if kind == "notification" {
                notifications.push(name);
            } else {
                methods.push(name);
            }
        }
        serde_json::json!({ "methods": methods, "notifications": notifications })
    }

    fn get_service_descriptor(&self) -> Value {
        let methods: Vec<Value> = self
            .enumerate()
            .into_iter()
            .map(|(name, kind, provider, restricted)| {
                serde_json::json!({
                    "name": name,
                    "type": kind,
                    "provider": provider.unwrap_or_default(),
                    "privileged": restricted,
                    "schema": {},
                })
            })
            .collect();
        serde_json::json!({ "methods": methods })
    }
}

/// The outcome of invoking a `Method` callable: either it ran to completion
/// (carrying its own `Ok`/`Err`), or it panicked. Kept distinguishable from
/// a handler's own `Err` so the dispatcher can attach sub-error `data` only
/// for the former — a caught panic becomes `ExecutionError` with *no*
/// data.
pub enum Invocation {
    /// The handler returned normally, successfully or not.
    Completed(JsonRpcResult),
    /// The handler panicked during invocation.
    Panicked,
}

/// Invokes a `Method` callable, catching a panic rather than letting it
/// unwind into the dispatcher/transport thread.
pub fn invoke_method_catching_panics(f: &MethodFn, id: &str, params: Option<&Value>) -> Invocation {
    match catch_unwind(AssertUnwindSafe(|| f(id, params))) {
        Ok(result) => Invocation::Completed(result),
        Err(_) => Invocation::Panicked,
    }
}

/// Invokes a `Notification` callable, swallowing any panic (best effort —
/// notifications never produce a response either way).
pub fn invoke_notification_catching_panics(f: &NotificationFn, params: Option<&Value>) {
    let _ = catch_unwind(AssertUnwindSafe(|| f(params)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::error::SubError;

    #[test]
    fn register_twice_yields_true_then_false() {
        let registry = Registry::new();
        let first = registry.register(
            "echo",
            HandlerKind::Notification(Arc::new(|_| {})),
            None,
            HandlerOptions::default(),
        );
        let second = registry.register(
            "echo",
            HandlerKind::Notification(Arc::new(|_| {})),
            None,
            HandlerOptions::default(),
        );
        assert!(first);
        assert!(!second);
    }

    #[test]
    fn builtins_are_present_and_non_restricted() {
        let registry = Registry::new();
        let record = registry.lookup("show_registered_handlers").unwrap();
        assert!(!record.options.restricted);
        let record = registry.lookup("get_service_descriptor").unwrap();
        assert!(!record.options.restricted);
    }

    #[test]
    fn lookup_of_unknown_method_is_none() {
        let registry = Registry::new();
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn panicking_method_is_reported_distinctly_from_a_returned_error() {
        let f: MethodFn = Arc::new(|_id, _params| panic!("boom"));
        let result = invoke_method_catching_panics(&f, "1", None);
        assert!(matches!(result, Invocation::Panicked));
    }

    #[test]
    fn a_returned_error_completes_normally() {
        let f: MethodFn = Arc::new(|_id, _params| Err(vec![SubError::new(1, "nope")]));
        let result = invoke_method_catching_panics(&f, "1", None);
        assert!(matches!(result, Invocation::Completed(Err(_))));
    }
}
