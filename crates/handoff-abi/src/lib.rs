//! C ABI for the handoff socket shim.
//!
//! Thin `extern "C"` wrappers over `handoff_core`. Every entry point checks
//! its pointers, converts core errors into `-1` plus `errno`, and never
//! unwinds across the boundary.

pub mod activation_abi;
pub mod sockaddr_abi;
pub mod sockopts_abi;

use std::ffi::c_int;

#[inline]
pub(crate) fn fail(errno: c_int) -> c_int {
    handoff_core::errno::set_errno(errno);
    -1
}
