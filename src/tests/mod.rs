//! Test infrastructure for the RPC management service.
//!
//! This module holds shared fixtures and property-test strategies used by
//! the per-module `#[cfg(test)]` suites, plus the cross-module tests kept
//! here because they exercise more than one public module at a time.

pub mod config_tests;
pub mod error_tests;

pub use test_utils::{create_test_dir, duration_strategy, jsonrpc_method_strategy, string_strategy, TestFixture};
