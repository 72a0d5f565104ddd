//! Plugin-method rendezvous: a process-wide mutex + condition variable +
//! result slot + completion flag.
//!
//! Grounded in `JsonRPCManager.cc`'s globals (`g_rpcHandlingMutex`,
//! `g_rpcHandlingCompletion`, `g_rpcHandlerResponseData`,
//! `g_rpcHandlerProccessingCompleted`). Safe only because exactly one
//! dispatcher thread waits at a time — guaranteed by the single-worker
//! transport (§5 of the design). A reimplementation targeting a
//! multi-worker transport would replace this with a per-request channel;
//! that migration requires no change to the dispatcher's external contract.

use parking_lot::{Condvar, Mutex};

/// What a plugin handler deposits once its out-of-band work completes.
pub type JsonRpcResult = Result<serde_json::Value, Vec<super::error::SubError>>;

struct RendezvousState {
    completed: bool,
    result: Option<JsonRpcResult>,
}

/// The shared rendezvous. One process-wide instance is used by the
/// dispatcher (see [`crate::protocol::jsonrpc::dispatcher::Dispatcher`]).
pub struct Rendezvous {
    state: Mutex<RendezvousState>,
    condvar: Condvar,
}

impl Rendezvous {
    /// Builds a new, idle rendezvous.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RendezvousState {
                completed: false,
                result: None,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Blocks the calling (dispatcher) thread until a plugin deposits a
    /// result, then consumes and clears it.
    pub fn wait_for_result(&self) -> JsonRpcResult {
        let mut guard = self.state.lock();
        while !guard.completed {
            self.condvar.wait(&mut guard);
        }
        guard.completed = false;
        guard
            .result
            .take()
            .expect("completed flag set without a deposited result")
    }

    /// Called by a plugin exactly once per invocation to deposit its
    /// result and wake the waiting dispatcher thread.
    pub fn deposit(&self, result: JsonRpcResult) {
        let mut guard = self.state.lock();
        guard.result = Some(result);
        guard.completed = true;
        self.condvar.notify_one();
    }
}

impl Default for Rendezvous {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn deposit_wakes_the_waiting_thread() {
        let rendezvous = Arc::new(Rendezvous::new());
        let writer = Arc::clone(&rendezvous);
        let handle = thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(20));
            writer.deposit(Ok(serde_json::json!("done")));
        });

        let result = rendezvous.wait_for_result();
        assert_eq!(result.unwrap(), serde_json::json!("done"));
        handle.join().unwrap();
    }
}
