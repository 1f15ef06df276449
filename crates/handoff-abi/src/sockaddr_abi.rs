//! ABI layer for address inspection and peer-address synthesis.

use std::ffi::c_int;

use handoff_core::errno;
use handoff_core::sockaddr::{Family, PeerCred, SockAddr};

use crate::fail;

/// Parse `addr`, rejecting null pointers, unknown families and buffers
/// shorter than the family's native structure.
unsafe fn read_addr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Result<SockAddr, c_int> {
    if addr.is_null() {
        return Err(errno::EFAULT);
    }
    // SAFETY: caller guarantees `len` readable bytes.
    let parsed = unsafe { SockAddr::from_raw(addr, len) };
    match parsed.socklen() {
        None => Err(errno::EAFNOSUPPORT),
        Some(native) if len < native => Err(errno::EINVAL),
        Some(_) => Ok(parsed),
    }
}

// ---------------------------------------------------------------------------
// handoff_sockaddr_is_loopback
// ---------------------------------------------------------------------------

/// 1 if `addr` is a loopback address, 0 if not, -1 with errno on bad input.
///
/// # Safety
///
/// `addr` must be readable for `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_sockaddr_is_loopback(
    addr: *const libc::sockaddr,
    len: libc::socklen_t,
) -> c_int {
    // SAFETY: forwarded caller contract.
    match unsafe { read_addr(addr, len) } {
        Ok(parsed) => c_int::from(parsed.is_loopback()),
        Err(e) => fail(e),
    }
}

// ---------------------------------------------------------------------------
// handoff_sockaddr_get_port / handoff_sockaddr_set_port
// ---------------------------------------------------------------------------

/// Port in host byte order, or -1 with errno.
///
/// # Safety
///
/// `addr` must be readable for `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_sockaddr_get_port(
    addr: *const libc::sockaddr,
    len: libc::socklen_t,
) -> c_int {
    // SAFETY: forwarded caller contract.
    match unsafe { read_addr(addr, len) } {
        Ok(parsed) => parsed.get_port().map_or_else(|| fail(errno::EAFNOSUPPORT), c_int::from),
        Err(e) => fail(e),
    }
}

/// Rewrite the port of `addr` in place. Returns 0 or -1 with errno.
///
/// # Safety
///
/// `addr` must be readable and writable for `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_sockaddr_set_port(
    addr: *mut libc::sockaddr,
    len: libc::socklen_t,
    port: u16,
) -> c_int {
    // SAFETY: forwarded caller contract.
    let mut parsed = match unsafe { read_addr(addr, len) } {
        Ok(parsed) => parsed,
        Err(e) => return fail(e),
    };
    if !parsed.set_port(port) {
        return fail(errno::EAFNOSUPPORT);
    }
    let bytes = parsed.as_bytes();
    // SAFETY: `read_addr` checked `len` covers the native structure, which is
    // exactly `bytes.len()`.
    unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), addr.cast::<u8>(), bytes.len()) };
    0
}

// ---------------------------------------------------------------------------
// handoff_peer_address
// ---------------------------------------------------------------------------

/// Synthesize the address a local peer on `fd` appears to connect from.
///
/// The host part encodes the peer's `SO_PEERCRED` credentials in `family`;
/// the port is `port`. Like `getpeername(2)`, at most `*addrlen` bytes are
/// written to `addr` and `*addrlen` is set to the full structure size.
///
/// # Safety
///
/// `addrlen` must be valid for reads and writes; `addr` must be writable for
/// `*addrlen` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn handoff_peer_address(
    fd: c_int,
    family: libc::sa_family_t,
    port: u16,
    addr: *mut libc::sockaddr,
    addrlen: *mut libc::socklen_t,
) -> c_int {
    if addr.is_null() || addrlen.is_null() {
        return fail(errno::EFAULT);
    }
    let Some(mut peer) = SockAddr::with_family(Family::from_raw(family)) else {
        return fail(errno::EAFNOSUPPORT);
    };
    let cred = match PeerCred::from_socket(fd) {
        Ok(cred) => cred,
        Err(e) => return fail(e),
    };
    peer.set_host_from_cred(&cred);
    peer.set_port(port);

    // SAFETY: `addrlen` is valid per contract.
    let avail = unsafe { *addrlen } as usize;
    // SAFETY: `addr` is writable for `avail` bytes per contract.
    let out = unsafe { std::slice::from_raw_parts_mut(addr.cast::<u8>(), avail) };
    match peer.write_truncated(out) {
        Some(full) => {
            // SAFETY: as above.
            unsafe { *addrlen = full };
            0
        }
        None => fail(errno::EAFNOSUPPORT),
    }
}
