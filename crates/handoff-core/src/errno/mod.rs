//! Error number helpers.
//!
//! Fallible system interactions in this crate return `Result<T, c_int>`
//! carrying the raw errno; this module reads and writes the thread's OS
//! errno and renders the values we produce as glibc-style messages.

use std::ffi::c_int;

pub const EPERM: c_int = libc::EPERM;
pub const ENOENT: c_int = libc::ENOENT;
pub const ESRCH: c_int = libc::ESRCH;
pub const EBADF: c_int = libc::EBADF;
pub const ENOMEM: c_int = libc::ENOMEM;
pub const EACCES: c_int = libc::EACCES;
pub const EFAULT: c_int = libc::EFAULT;
pub const EINVAL: c_int = libc::EINVAL;
pub const EMFILE: c_int = libc::EMFILE;
pub const ENOTTY: c_int = libc::ENOTTY;
pub const ENOTSOCK: c_int = libc::ENOTSOCK;
pub const ENOPROTOOPT: c_int = libc::ENOPROTOOPT;
pub const EOPNOTSUPP: c_int = libc::EOPNOTSUPP;
pub const EAFNOSUPPORT: c_int = libc::EAFNOSUPPORT;
pub const ENOTCONN: c_int = libc::ENOTCONN;

/// Returns the error message string for the given errno value.
pub fn strerror_message(errnum: c_int) -> &'static str {
    match errnum {
        0 => "Success",
        EPERM => "Operation not permitted",
        ENOENT => "No such file or directory",
        ESRCH => "No such process",
        EBADF => "Bad file descriptor",
        ENOMEM => "Cannot allocate memory",
        EACCES => "Permission denied",
        EFAULT => "Bad address",
        EINVAL => "Invalid argument",
        EMFILE => "Too many open files",
        ENOTTY => "Inappropriate ioctl for device",
        ENOTSOCK => "Socket operation on non-socket",
        ENOPROTOOPT => "Protocol not available",
        EOPNOTSUPP => "Operation not supported",
        EAFNOSUPPORT => "Address family not supported by protocol",
        ENOTCONN => "Transport endpoint is not connected",
        _ => "Unknown error",
    }
}

/// Errno left behind by the most recent failing libc call on this thread.
///
/// Falls back to `EINVAL` when the OS reports no code at all.
#[must_use]
pub fn last_errno() -> c_int {
    std::io::Error::last_os_error()
        .raw_os_error()
        .unwrap_or(EINVAL)
}

/// Sets the calling thread's errno.
pub fn set_errno(value: c_int) {
    // SAFETY: `__errno_location` returns the calling thread's errno slot.
    unsafe { *libc::__errno_location() = value };
}
