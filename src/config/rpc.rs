//! RPC transport configuration module.
//!
//! This module defines configuration for the JSON-RPC management service's
//! Unix-domain-socket transport, mirroring the `rpc.*` key table.

use super::ConfigResult;
use super::Validate;
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default incoming request size cap: 3x the accumulator's stack area.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 3 * crate::accumulator::DEFAULT_STACK_SIZE;

/// Communication type. Only `LocalStreamSocket` (wire value `1`) is required.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommType {
    /// A Unix-domain stream socket in the local filesystem namespace.
    LocalStreamSocket = 1,
}

impl Default for CommType {
    fn default() -> Self {
        Self::LocalStreamSocket
    }
}

/// Settings for the Unix-domain-socket transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommConfig {
    /// Filesystem path of the listening socket.
    pub sock_path_name: PathBuf,

    /// Filesystem path of the single-instance exclusive lock file.
    pub lock_path_name: PathBuf,

    /// Listen backlog passed to `listen(2)`.
    pub backlog: i32,

    /// Maximum number of retries on a transient error within one operation.
    pub max_retry_on_transient_errors: u32,

    /// When true, the socket file is created `0700` and the credential
    /// checker rejects peers whose uid differs from the server's; when
    /// false, the socket is `0777` and no credential check is enforced.
    pub restricted_api: bool,

    /// Maximum number of bytes accepted for one inbound request.
    pub incoming_request_max_size: usize,
}

impl Default for CommConfig {
    fn default() -> Self {
        Self {
            sock_path_name: PathBuf::from("/tmp/jsonrpc20.sock"),
            lock_path_name: PathBuf::from("/tmp/jsonrpc20.lock"),
            backlog: 5,
            max_retry_on_transient_errors: 64,
            restricted_api: true,
            incoming_request_max_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

impl Validate for CommConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.backlog <= 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "rpc.comm_config.backlog".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.incoming_request_max_size == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "rpc.comm_config.incoming_request_max_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Top-level RPC service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// When false, the service is not started at all.
    pub enabled: bool,

    /// Selected communication mechanism.
    pub comm_type: CommType,

    /// Transport-specific settings.
    pub comm_config: CommConfig,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            comm_type: CommType::default(),
            comm_config: CommConfig::default(),
        }
    }
}

impl Validate for RpcConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.comm_config.validate()
    }
}
