//! Minimal hand-written FFI for the handful of POSIX calls this transport
//! needs that no crate in this workspace's dependency stack otherwise
//! provides: `flock(2)` for the single-instance lock, `poll(2)` for
//! readiness waits, and `getsockopt(SO_PEERCRED)` for the credential check.
//!
//! Deliberately not pulled in via the `libc` crate: nothing else in this
//! crate needs a general POSIX surface, so one extra dependency would buy
//! three function signatures. If a later addition needs more of libc than
//! this, switch this module out for the real crate rather than growing it
//! further by hand.

#![allow(non_camel_case_types)]

use std::io;
use std::os::unix::io::RawFd;

pub const LOCK_EX: std::ffi::c_int = 2;
pub const LOCK_NB: std::ffi::c_int = 4;

pub const POLLIN: std::ffi::c_short = 0x0001;

#[repr(C)]
pub struct pollfd {
    pub fd: RawFd,
    pub events: std::ffi::c_short,
    pub revents: std::ffi::c_short,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ucred {
    pub pid: i32,
    pub uid: u32,
    pub gid: u32,
}

extern "C" {
    fn flock(fd: RawFd, operation: std::ffi::c_int) -> std::ffi::c_int;
    fn poll(fds: *mut pollfd, nfds: u64, timeout: std::ffi::c_int) -> std::ffi::c_int;
    fn getsockopt(
        sockfd: RawFd,
        level: std::ffi::c_int,
        optname: std::ffi::c_int,
        optval: *mut std::ffi::c_void,
        optlen: *mut u32,
    ) -> std::ffi::c_int;
    fn getuid() -> u32;
}

const SOL_SOCKET: std::ffi::c_int = 1;
const SO_PEERCRED: std::ffi::c_int = 17;

/// Takes an exclusive, non-blocking advisory lock on `fd`.
///
/// Returns `Ok(true)` if the lock was acquired, `Ok(false)` if another
/// process already holds it (`EWOULDBLOCK`), and `Err` for any other
/// failure.
pub fn try_lock_exclusive(fd: RawFd) -> io::Result<bool> {
    let ret = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
    if ret == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc_ewouldblock) if libc_ewouldblock == 11 || libc_ewouldblock == 35 => Ok(false),
        _ => Err(err),
    }
}

/// Blocks until `fd` is readable or `timeout_ms` elapses (-1 blocks
/// forever). Returns `true` if the descriptor became readable, `false` on
/// timeout.
pub fn poll_readable(fd: RawFd, timeout_ms: i32) -> io::Result<bool> {
    let mut pfd = pollfd {
        fd,
        events: POLLIN,
        revents: 0,
    };
    loop {
        let ret = unsafe { poll(&mut pfd, 1, timeout_ms) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if ret == 0 {
            return Ok(false);
        }
        return Ok(pfd.revents & POLLIN != 0);
    }
}

/// Reads the connecting peer's credentials via `SO_PEERCRED`.
/// Linux-specific; other platforms have their own (different) mechanism.
#[cfg(target_os = "linux")]
pub fn peer_credentials(fd: RawFd) -> io::Result<ucred> {
    let mut cred = ucred::default();
    let mut len = std::mem::size_of::<ucred>() as u32;
    let ret = unsafe {
        getsockopt(
            fd,
            SOL_SOCKET,
            SO_PEERCRED,
            &mut cred as *mut ucred as *mut std::ffi::c_void,
            &mut len,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(cred)
}

/// This process's effective uid, for comparison against a peer's.
pub fn current_uid() -> u32 {
    unsafe { getuid() }
}
