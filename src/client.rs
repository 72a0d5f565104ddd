//! A synchronous client for talking to a running RPCd instance over its
//! Unix socket.
//!
//! Grounded in `IPCSocketClient.cc`: connect with a bounded number of
//! retries on a transient "not ready yet" error, a full-request write with
//! partial-write retry, and a read loop that keeps reading until the peer
//! closes the connection or a timeout elapses.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::error::transport::TransportError;

/// Default number of connection attempts before giving up.
const DEFAULT_CONNECT_ATTEMPTS: u32 = 8;

/// Default delay between connection attempts.
const DEFAULT_CONNECT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Default total time budget for reading a response.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A client bound to a specific socket path.
pub struct Client {
    socket_path: PathBuf,
    connect_attempts: u32,
    connect_retry_delay: Duration,
    read_timeout: Duration,
}

impl Client {
    /// Builds a client with the default retry/timeout parameters.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_retry_delay: DEFAULT_CONNECT_RETRY_DELAY,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Overrides the number of connection attempts.
    pub fn with_connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    /// Overrides the total read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// The configured total read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Connects, retrying on a refused/not-yet-listening socket.
    fn connect(&self) -> Result<UnixStream, TransportError> {
        let mut last_err = None;
        for attempt in 0..self.connect_attempts.max(1) {
            match UnixStream::connect(&self.socket_path) {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    last_err = Some(err);
                    if attempt + 1 < self.connect_attempts {
                        std::thread::sleep(self.connect_retry_delay);
                    }
                }
            }
        }
        Err(TransportError::Io(last_err.expect(
            "loop runs at least once so an error is always recorded on failure",
        )))
    }

    /// Writes the full buffer, retrying on a partial write.
    fn write_all(&self, stream: &mut UnixStream, data: &[u8]) -> Result<(), TransportError> {
        let mut written = 0;
        while written < data.len() {
            match stream.write(&data[written..]) {
                Ok(0) => return Err(TransportError::PartialRead),
                Ok(n) => written += n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    /// Reads until the peer closes the connection or the total read
    /// timeout elapses, whichever comes first.
    fn read_all(&self, stream: &mut UnixStream) -> Result<Vec<u8>, TransportError> {
        stream
            .set_read_timeout(Some(self.read_timeout))
            .map_err(TransportError::Io)?;

        let deadline = Instant::now() + self.read_timeout;
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout(self.read_timeout.as_millis() as u64));
            }
            match stream.read(&mut chunk) {
                Ok(0) => return Ok(buf),
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    return Err(TransportError::Timeout(self.read_timeout.as_millis() as u64))
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Sends one request and returns whatever bytes the peer writes back
    /// before closing the connection. A pure notification produces no
    /// bytes, so an empty `Vec` is a valid, successful result.
    pub fn call(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut stream = self.connect()?;
        self.write_all(&mut stream, request)?;
        stream.shutdown(std::net::Shutdown::Write).ok();
        self.read_all(&mut stream)
    }
}
