//! ABI layer for the option ledger.
//!
//! A ledger is an opaque heap handle owned by the caller: created with
//! `handoff_sockopts_new`, released with `handoff_sockopts_free`.

use std::ffi::{c_int, c_ulong, c_void};

use handoff_core::errno;
use handoff_core::sockopts::{self, SockOpts};

use crate::fail;

// ---------------------------------------------------------------------------
// handoff_sockopts_new / handoff_sockopts_free
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn handoff_sockopts_new() -> *mut SockOpts {
    Box::into_raw(Box::new(SockOpts::new()))
}

/// # Safety
///
/// `opts` must be null or a handle from [`handoff_sockopts_new`] that has not
/// been freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_sockopts_free(opts: *mut SockOpts) {
    if opts.is_null() {
        return;
    }
    // SAFETY: caller hands back ownership of a live handle.
    drop(unsafe { Box::from_raw(opts) });
}

// ---------------------------------------------------------------------------
// handoff_sockopts_capture_option
// ---------------------------------------------------------------------------

/// Record a `setsockopt(level, name, value, len)` call.
///
/// Returns 0, or -1 with `EFAULT` for a null handle or a null `value` with a
/// non-zero `len`.
///
/// # Safety
///
/// `opts` must be a live handle; `value` must be readable for `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_sockopts_capture_option(
    opts: *mut SockOpts,
    level: c_int,
    name: c_int,
    value: *const c_void,
    len: libc::socklen_t,
) -> c_int {
    if opts.is_null() || (value.is_null() && len != 0) {
        return fail(errno::EFAULT);
    }
    let value = if len == 0 {
        &[][..]
    } else {
        // SAFETY: non-null and readable for `len` bytes per contract.
        unsafe { std::slice::from_raw_parts(value.cast::<u8>(), len as usize) }
    };
    // SAFETY: live handle per contract.
    unsafe { &mut *opts }.capture_option(level, name, value);
    0
}

// ---------------------------------------------------------------------------
// handoff_sockopts_capture_ioctl
// ---------------------------------------------------------------------------

/// Record an `ioctl(request, arg)` call.
///
/// Returns 1 when the request is tracked and was recorded, 0 when it is not
/// tracked, -1 with `EFAULT` for null pointers.
///
/// # Safety
///
/// `opts` must be a live handle; for tracked requests `arg` must point at the
/// request's argument (`pid_t` for `SIOCSPGRP`, `int` for `FIOASYNC`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_sockopts_capture_ioctl(
    opts: *mut SockOpts,
    request: c_ulong,
    arg: *const c_void,
) -> c_int {
    if opts.is_null() {
        return fail(errno::EFAULT);
    }
    let Some(len) = sockopts::ioctl_arg_len(request) else {
        return 0;
    };
    if arg.is_null() {
        return fail(errno::EFAULT);
    }
    // SAFETY: tracked requests take a `len`-byte argument.
    let arg = unsafe { std::slice::from_raw_parts(arg.cast::<u8>(), len) };
    // SAFETY: live handle per contract.
    c_int::from(unsafe { &mut *opts }.capture_ioctl(request, arg))
}

// ---------------------------------------------------------------------------
// handoff_sockopts_replay
// ---------------------------------------------------------------------------

/// Copy descriptor flags and replay the ledger from `old_fd` onto `new_fd`.
///
/// Returns 0, or -1 with `errno` set to the failing call's error. The failure
/// is also logged.
///
/// # Safety
///
/// `opts` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_sockopts_replay(
    opts: *mut SockOpts,
    old_fd: c_int,
    new_fd: c_int,
) -> c_int {
    if opts.is_null() {
        return fail(errno::EFAULT);
    }
    // SAFETY: live handle per contract.
    match unsafe { &mut *opts }.replay_host(old_fd, new_fd) {
        Ok(()) => 0,
        Err(err) => fail(err.errno),
    }
}

// ---------------------------------------------------------------------------
// handoff_sockopts_len
// ---------------------------------------------------------------------------

/// Entries waiting to be replayed; 0 for a null handle.
///
/// # Safety
///
/// `opts` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_sockopts_len(opts: *const SockOpts) -> usize {
    if opts.is_null() {
        return 0;
    }
    // SAFETY: live handle per contract.
    unsafe { &*opts }.len()
}
