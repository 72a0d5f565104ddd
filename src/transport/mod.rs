//! Unix-domain-socket transport: bind/lock/listen, a single worker thread
//! accepting and serving one connection at a time, and a per-connection
//! read loop backed by the [`crate::accumulator::Accumulator`].
//!
//! Grounded in `LocalUnixSocket.cc`/`LocalUnixSocket.h`: `flock(2)` on a
//! dedicated lock file enforces a single running instance, stale sockets
//! are unlinked before bind, and the worker loop polls for readiness before
//! `accept`/`read`, retrying transient errors up to a configurable cap.

mod ffi;

use std::fs;
use std::io::{self, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::accumulator::Accumulator;
use crate::config::rpc::CommConfig;
use crate::error::transport::TransportError;
use crate::protocol::jsonrpc::{Context, Engine};

/// Errors that are worth retrying rather than failing the whole operation:
/// an interrupted syscall or a transient resource shortage. Mirrors
/// `LocalUnixSocket::check_for_transient_errors`.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    ) || matches!(err.raw_os_error(), Some(11) | Some(35) | Some(12))
}

/// Runs `f`, retrying while it fails with a transient error, up to
/// `max_retries` attempts.
fn retrying<T>(max_retries: u32, mut f: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err = None;
    for _ in 0..max_retries.max(1) {
        match f() {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) => last_err = Some(err),
            Err(err) => return Err(err),
        }
    }
    tracing::warn!(max_retries, "exhausted retries on transient errors");
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "max retries exceeded")))
}

/// Holds the lock file open for the transport's lifetime; dropping it
/// releases the advisory lock.
struct LockGuard {
    _file: fs::File,
}

fn acquire_lock(path: &std::path::Path) -> Result<LockGuard, TransportError> {
    let file = fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .mode(0o600)
        .open(path)
        .map_err(TransportError::Io)?;

    match ffi::try_lock_exclusive(file.as_raw_fd()) {
        Ok(true) => Ok(LockGuard { _file: file }),
        Ok(false) => Err(TransportError::LockHeld(path.display().to_string())),
        Err(err) => Err(TransportError::Io(err)),
    }
}

/// An accepted peer connection, wrapping the raw stream with the
/// poll-then-read loop used to read one complete request.
pub struct PeerConnection {
    stream: UnixStream,
    peer_privileged: bool,
}

impl PeerConnection {
    /// Whether this connection's peer credentials matched the server
    /// process's own — consulted per handler at dispatch time (via a
    /// [`crate::protocol::jsonrpc::Context`] checker keyed off a handler's
    /// `restricted` option), never used to reject the connection itself.
    pub fn peer_privileged(&self) -> bool {
        self.peer_privileged
    }

    /// Reads bytes from the peer into `accumulator` until a complete
    /// JSON document boundary is detected (closing `}`/`]` at nesting depth
    /// zero outside a string) or the peer closes the connection.
    ///
    /// Returns `Ok(true)` once a message was read, `Ok(false)` if the peer
    /// closed without sending anything. A full accumulator before a
    /// complete message is seen closes the connection per the
    /// close-on-first-`FULL_BUFFER` policy.
    pub fn read_message<const N: usize>(
        &mut self,
        accumulator: &mut Accumulator<N>,
        max_total: usize,
        poll_timeout_ms: i32,
    ) -> Result<bool, TransportError> {
        loop {
            if !ffi::poll_readable(self.stream.as_raw_fd(), poll_timeout_ms)
                .map_err(TransportError::Io)?
            {
                return Ok(accumulator.stored() > 0);
            }

            if accumulator.area_is_full() {
                let mut spill = [0u8; 4096];
                let n = self.stream.read(&mut spill).map_err(TransportError::Io)?;
                if n == 0 {
                    return Ok(accumulator.stored() > 0);
                }
                accumulator
                    .push_overflow(&spill[..n])
                    .map_err(|_| TransportError::FullBuffer)?;
            } else {
                let n = {
                    let area = accumulator.writable_area();
                    self.stream.read(area).map_err(TransportError::Io)?
                };
                if n == 0 {
                    return Ok(accumulator.stored() > 0);
                }
                accumulator.commit(n);
            }

            if accumulator.is_at_capacity(max_total) {
                return Err(TransportError::FullBuffer);
            }

            if is_complete_json(&accumulator.finalize()) {
                return Ok(true);
            }
        }
    }

    /// Writes the full response buffer, retrying on partial writes.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(bytes).map_err(TransportError::Io)
    }
}

/// A lightweight, allocation-free completeness check: valid JSON documents
/// this service accepts are either a single object or a non-empty array,
/// so tracking brace/bracket nesting (honoring string literals and escapes)
/// is enough to know a full document has arrived without fully parsing it.
fn is_complete_json(text: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut saw_open = false;

    for ch in text.trim_start().chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => {
                depth += 1;
                saw_open = true;
            }
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }

    saw_open && depth == 0
}

/// The Unix-domain-socket transport: owns the listening socket, the
/// single-instance lock, and the worker thread's running flag.
pub struct Transport {
    config: CommConfig,
    listener: Option<UnixListener>,
    _lock: Option<LockGuard>,
    running: Arc<AtomicBool>,
}

impl Transport {
    /// Builds a transport from configuration without binding yet.
    pub fn new(config: CommConfig) -> Self {
        Self {
            config,
            listener: None,
            _lock: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Acquires the single-instance lock, removes any stale socket file,
    /// binds, and starts listening. Idempotent only in the sense that
    /// calling it twice rebinds; callers should call it once.
    pub fn bind(&mut self) -> Result<(), TransportError> {
        let lock = acquire_lock(&self.config.lock_path_name)?;

        let _ = fs::remove_file(&self.config.sock_path_name);

        let listener = retrying(self.config.max_retry_on_transient_errors, || {
            UnixListener::bind(&self.config.sock_path_name)
        })
        .map_err(|source| TransportError::Bind {
            path: self.config.sock_path_name.display().to_string(),
            source,
        })?;

        listener.set_nonblocking(true).map_err(TransportError::Io)?;

        let mode = if self.config.restricted_api { 0o700 } else { 0o777 };
        fs::set_permissions(&self.config.sock_path_name, fs::Permissions::from_mode(mode))
            .map_err(TransportError::Io)?;

        self.listener = Some(listener);
        self._lock = Some(lock);
        tracing::info!(
            path = %self.config.sock_path_name.display(),
            mode = format_args!("{mode:o}"),
            "bound and listening"
        );
        Ok(())
    }

    /// Whether the worker loop should keep running; checked between
    /// iterations and used by [`Self::stop`] to request a shutdown.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Accepts one connection and reads its peer credentials. The
    /// credential match itself is never used to reject the connection here —
    /// the dispatcher consults it per handler, keyed off that handler's
    /// `restricted` option. Blocks (with periodic re-poll so the running
    /// flag is observed) until a peer connects or the transport is stopped.
    pub fn accept(&self) -> Result<Option<PeerConnection>, TransportError> {
        let listener = self
            .listener
            .as_ref()
            .ok_or(TransportError::NotRunning)?;

        loop {
            if !self.running.load(Ordering::Acquire) {
                return Ok(None);
            }

            match ffi::poll_readable(listener.as_raw_fd(), 250) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) if is_transient(&err) => continue,
                Err(err) => return Err(TransportError::PollError(err.to_string())),
            }

            match listener.accept() {
                Ok((stream, _addr)) => {
                    let peer_privileged = self.check_peer(&stream);
                    tracing::debug!(peer_privileged, "accepted connection");
                    return Ok(Some(PeerConnection {
                        stream,
                        peer_privileged,
                    }));
                }
                Err(err) if is_transient(&err) => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Whether the connecting peer's credentials match the server process's
    /// own. Always computed regardless of `restricted_api` — that flag only
    /// selects the socket's filesystem permission bits (see
    /// [`Self::bind`]); a handler marked `restricted` is still gated on this
    /// result no matter how the socket file itself was secured.
    #[cfg(target_os = "linux")]
    fn check_peer(&self, stream: &UnixStream) -> bool {
        match ffi::peer_credentials(stream.as_raw_fd()) {
            Ok(cred) => cred.uid == ffi::current_uid(),
            Err(_) => false,
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn check_peer(&self, _stream: &UnixStream) -> bool {
        false
    }

    /// Signals the worker loop (and any in-progress `accept`) to stop.
    pub fn request_stop(&self) {
        tracing::info!("stop requested");
        self.running.store(false, Ordering::Release);
    }

    /// Marks the transport running; called once by the worker thread
    /// before entering its accept loop.
    pub fn mark_running(&self) {
        self.running.store(true, Ordering::Release);
    }

    /// The configured maximum request size, used to size the read loop's
    /// capacity check.
    pub fn max_request_size(&self) -> usize {
        self.config.incoming_request_max_size
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.config.sock_path_name);
    }
}

/// Runs the single worker thread's accept-serve loop until told to stop.
/// Extracted as a free function so [`crate::server::Server`] can run it on
/// a dedicated `JoinHandle` without `Transport` itself needing to be
/// `'static` in the general case.
///
/// `context` is the host's base authorisation context; each accepted
/// connection derives its own context from it via
/// [`Context::with_additional_checker`], layering on a credential checker
/// keyed to that one connection's peer. Gating happens inside
/// `engine.handle_call` per handler, never here — a connection is always
/// read and dispatched regardless of its peer's credentials.
pub fn run(transport: &Transport, engine: &Engine, context: &Context) {
    transport.mark_running();
    loop {
        let mut peer = match transport.accept() {
            Ok(Some(peer)) => peer,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "accept failed");
                continue;
            }
        };

        let peer_privileged = peer.peer_privileged();
        let conn_context = context.with_additional_checker(move |options| {
            if options.restricted && !peer_privileged {
                Some("peer is not privileged".to_string())
            } else {
                None
            }
        });

        let mut accumulator: Accumulator = Accumulator::new();
        match peer.read_message(&mut accumulator, transport.max_request_size(), 250) {
            Ok(true) => {
                let request = accumulator.finalize();
                if let Some(response) = engine.handle_call(&conn_context, request.as_bytes()) {
                    if let Err(err) = peer.write_all(&response) {
                        tracing::debug!(error = %err, "failed writing response");
                    }
                }
            }
            Ok(false) => {}
            Err(err) => {
                tracing::debug!(error = %err, "failed reading request");
            }
        }
    }
}
