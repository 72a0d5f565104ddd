//! Server lifecycle: own a bound transport and the single worker thread
//! that serves it, with `start`/`stop` semantics.
//!
//! Grounded in `RpcServer.cc`: a thread handle plus a transport, `stop()`
//! signals the transport and joins the thread, and the destructor implies
//! `stop()` so a dropped server never leaks its worker.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::config::rpc::CommConfig;
use crate::error::transport::TransportError;
use crate::protocol::jsonrpc::{Context, Engine, Registry};
use crate::transport::{self, Transport};

/// Owns a bound [`Transport`] and the worker thread serving it.
pub struct Server {
    transport: Arc<Transport>,
    engine: Arc<Engine>,
    context: Arc<Context>,
    worker: Option<JoinHandle<()>>,
}

impl Server {
    /// Builds and binds a new server around the given transport
    /// configuration, with a fresh [`Registry`] and an empty authorisation
    /// [`Context`].
    pub fn new(config: CommConfig) -> Result<Self, TransportError> {
        let mut transport = Transport::new(config);
        transport.bind()?;
        Ok(Self {
            transport: Arc::new(transport),
            engine: Arc::new(Engine::new()),
            context: Arc::new(Context::new()),
            worker: None,
        })
    }

    /// Builds a server sharing an existing registry, e.g. one a host
    /// populated with application-specific handlers before starting.
    pub fn with_registry(config: CommConfig, registry: Arc<Registry>) -> Result<Self, TransportError> {
        let mut transport = Transport::new(config);
        transport.bind()?;
        Ok(Self {
            transport: Arc::new(transport),
            engine: Arc::new(Engine::with_registry(registry)),
            context: Arc::new(Context::new()),
            worker: None,
        })
    }

    /// The underlying registry, for registering handlers before (or after)
    /// starting the worker thread.
    pub fn registry(&self) -> &Arc<Registry> {
        self.engine.registry()
    }

    /// Spawns the single dedicated worker thread and returns immediately.
    pub fn start(&mut self) -> Result<(), TransportError> {
        if self.worker.is_some() {
            return Err(TransportError::AlreadyRunning);
        }
        let transport = Arc::clone(&self.transport);
        let engine = Arc::clone(&self.engine);
        let context = Arc::clone(&self.context);
        self.worker = Some(std::thread::spawn(move || {
            transport::run(&transport, &engine, &context);
        }));
        Ok(())
    }

    /// Signals the worker thread to stop and joins it. Safe to call
    /// multiple times.
    pub fn stop(&mut self) {
        self.transport.request_stop();
        if let Some(handle) = self.worker.take() {
            if let Err(panic) = handle.join() {
                tracing::warn!(?panic, "rpcd worker thread panicked");
            }
        }
    }

    /// Whether the worker thread is currently running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}
